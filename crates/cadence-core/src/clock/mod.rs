//! Tick sources.
//!
//! A [`Clock`] is the on/off switch of a session. The engine proxies its own
//! start/pause/resume/stop transitions to it; how ticks actually reach the
//! engine depends on the implementation:
//!
//! - [`ManualClock`]: the caller fires ticks itself (tests, host-owned timers).
//! - [`Ticker`]: a tokio task delivering one [`Tick`] per period through
//!   [`Ticker::next_tick`].

mod manual;
mod ticker;

use serde::{Deserialize, Serialize};

pub use manual::ManualClock;
pub use ticker::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    /// Never started.
    Idle,
    Running,
    Paused,
    /// Emission ended. A later `start()` begins a fresh run.
    Stopped,
}

/// One timer callback. `seq` counts ticks since the clock was last started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub seq: u64,
}

/// Control surface shared by every tick source.
///
/// All operations are idempotent: `start()` on a running clock, `pause()` on
/// a paused or stopped clock and `stop()` on a stopped clock do nothing.
pub trait Clock {
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn status(&self) -> ClockStatus;

    fn is_running(&self) -> bool {
        self.status() == ClockStatus::Running
    }
}
