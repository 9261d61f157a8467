use cadence_core::{CeilingCounter, Config, Database, UsageStore};
use clap::Subcommand;
use serde::Serialize;
use tracing::warn;

use super::{CmdResult, EXIT_LIMIT_REACHED};
use crate::output::print_json;

const DEFAULT_KEY: &str = "call-duration";

#[derive(Subcommand)]
pub enum CallAction {
    /// Show elapsed call time against the limit
    Status {
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
    /// Add elapsed seconds; exits with status 2 once the limit is reached
    Advance {
        #[arg(long, default_value_t = 1)]
        seconds: u64,
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
    /// End the call and clear its counter
    End {
        #[arg(long, default_value = DEFAULT_KEY)]
        key: String,
    },
}

#[derive(Serialize)]
struct CallReport {
    elapsed_seconds: u64,
    limit_seconds: u64,
    remaining_seconds: u64,
    exceeded: bool,
}

impl From<&CeilingCounter> for CallReport {
    fn from(counter: &CeilingCounter) -> Self {
        Self {
            elapsed_seconds: counter.elapsed_seconds,
            limit_seconds: counter.limit_seconds,
            remaining_seconds: counter.remaining_seconds(),
            exceeded: counter.is_exceeded(),
        }
    }
}

/// Stored counter with the configured limit applied.
fn current(db: &Database, config: &Config, key: &str) -> Result<CeilingCounter, Box<dyn std::error::Error>> {
    let fresh = config.call_ceiling()?;
    Ok(match db.load_ceiling(key)? {
        Some(stored) => CeilingCounter {
            limit_seconds: fresh.limit_seconds,
            ..stored
        },
        None => fresh,
    })
}

pub fn run(action: CallAction) -> CmdResult {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        CallAction::Status { key } => {
            let counter = current(&db, &config, &key)?;
            print_json(&CallReport::from(&counter))?;
            Ok(0)
        }
        CallAction::Advance { seconds, key } => {
            let counter = current(&db, &config, &key)?.advance(seconds);
            db.save_ceiling(&key, &counter)?;
            print_json(&CallReport::from(&counter))?;
            if counter.is_exceeded() {
                warn!(key = %key, elapsed = counter.elapsed_seconds, "call limit reached");
                Ok(EXIT_LIMIT_REACHED)
            } else {
                Ok(0)
            }
        }
        CallAction::End { key } => {
            let counter = current(&db, &config, &key)?;
            db.clear(&key)?;
            print_json(&CallReport::from(&counter))?;
            Ok(0)
        }
    }
}
