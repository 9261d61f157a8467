use cadence_core::Database;
use chrono::{Local, TimeZone, Utc};
use serde_json::json;

use super::CmdResult;
use crate::output::print_json;

pub fn run(recent: usize) -> CmdResult {
    let db = Database::open()?;

    let midnight = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let stats = db.stats(midnight)?;

    if recent == 0 {
        print_json(&stats)?;
    } else {
        let sessions = db.recent_sessions(recent)?;
        print_json(&json!({ "stats": stats, "recent": sessions }))?;
    }
    Ok(0)
}
