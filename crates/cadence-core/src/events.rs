use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionStatus;

/// Every session state change produces an Event.
/// Adapters subscribe to them to play cues, stop playback or redraw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        exercise: String,
        phase_index: usize,
        phase_name: String,
        duration_secs: u64,
        cycles: u32,
        at: DateTime<Utc>,
    },
    /// A new phase was entered. Emitted on cycle wrap as well.
    PhaseChanged {
        phase_index: usize,
        phase_name: String,
        duration_secs: u64,
        cycle: u32,
        at: DateTime<Utc>,
    },
    /// The last phase of the last cycle ran out. Emitted exactly once.
    Completed {
        exercise: String,
        cycles: u32,
        at: DateTime<Utc>,
    },
    PausedChanged {
        paused: bool,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        exercise: String,
        phase_index: usize,
        phase_name: String,
        cycle: u32,
        cycles: u32,
        remaining_secs: u64,
        total_secs: u64,
        session_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short name used for logging and human-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "session_started",
            Event::PhaseChanged { .. } => "phase_changed",
            Event::Completed { .. } => "completed",
            Event::PausedChanged { .. } => "paused_changed",
            Event::Reset { .. } => "reset",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = Event::Reset { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reset");
        assert_eq!(event.kind(), "reset");
    }

    #[test]
    fn phase_changed_carries_cycle() {
        let event = Event::PhaseChanged {
            phase_index: 2,
            phase_name: "exhale".into(),
            duration_secs: 8,
            cycle: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
