use cadence_core::{Config, Database, QuotaPolicy, UsageStore, UsageWindow};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use tracing::warn;

use super::{CmdResult, EXIT_LIMIT_REACHED};
use crate::output::print_json;

const DEFAULT_KEY: &str = "chat-quota";

#[derive(Subcommand)]
pub enum QuotaAction {
    /// Show the current window without counting anything
    Status {
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
    /// Count one action; exits with status 2 when the limit is reached
    Use {
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
    /// Forget the stored window
    Reset {
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
}

#[derive(Serialize)]
struct QuotaReport {
    allowed: bool,
    count: u32,
    limit: u32,
    remaining: u32,
    resets_at: Option<DateTime<Utc>>,
}

impl QuotaReport {
    fn new(policy: &QuotaPolicy, window: &UsageWindow, allowed: bool, now: DateTime<Utc>) -> Self {
        Self {
            allowed,
            count: window.count,
            limit: policy.limit,
            remaining: policy.remaining(window, now),
            resets_at: window.resets_at(),
        }
    }
}

pub fn run(action: QuotaAction) -> CmdResult {
    let config = Config::load_or_default();
    let policy = config.chat_policy();
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        QuotaAction::Status { key } => {
            let stored = db
                .load_window(&key)?
                .unwrap_or_else(|| policy.new_window(now));
            let window = policy.check(&stored, now);
            let allowed = window.count < policy.limit;
            print_json(&QuotaReport::new(&policy, &window, allowed, now))?;
            Ok(0)
        }
        QuotaAction::Use { key } => {
            let stored = db
                .load_window(&key)?
                .unwrap_or_else(|| policy.new_window(now));
            let decision = policy.try_increment(&stored, now);
            db.save_window(&key, &decision.window)?;
            print_json(&QuotaReport::new(
                &policy,
                &decision.window,
                decision.allowed,
                now,
            ))?;
            if decision.allowed {
                Ok(0)
            } else {
                warn!(key = %key, limit = policy.limit, "quota limit reached");
                Ok(EXIT_LIMIT_REACHED)
            }
        }
        QuotaAction::Reset { key } => {
            if db.clear(&key)? {
                println!("quota '{key}' reset");
            } else {
                println!("quota '{key}' had no usage recorded");
            }
            Ok(0)
        }
    }
}
