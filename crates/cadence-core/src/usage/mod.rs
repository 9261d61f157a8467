//! Caller-owned usage counters.
//!
//! Neither type here keeps hidden state: every operation takes the persisted
//! record and returns the next one.

pub mod ceiling;
pub mod window;

pub use ceiling::CeilingCounter;
pub use window::{check_and_reset, remaining, try_increment, QuotaDecision, QuotaPolicy, UsageWindow};
