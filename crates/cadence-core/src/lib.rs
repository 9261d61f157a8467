//! # Cadence Core Library
//!
//! Timed-session and quota engine behind the guided breathing exerciser,
//! the soundscape sleep timer and the chat/call usage gates.
//!
//! ## Architecture
//!
//! - **Clock**: one-tick-per-second sources ([`ManualClock`] for callers that
//!   drive ticks themselves, [`Ticker`] for a tokio interval)
//! - **Session**: the phase-cycle engine counting through an
//!   [`ExerciseDefinition`] and reporting transitions as [`Event`]s
//! - **Usage**: the rolling-window quota meter and the non-resetting ceiling
//!   counter, both pure functions over caller-owned records
//! - **Storage**: TOML configuration and SQLite persistence used by adapters;
//!   the engine itself performs no I/O
//!
//! Side effects (audio cues, paywalls, stopping playback) belong to the
//! caller, which reacts to the events and quota decisions returned here.

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod usage;

pub use clock::{Clock, ClockStatus, ManualClock, Tick, Ticker};
pub use error::{ConfigError, CoreError, DatabaseError, DefinitionError};
pub use events::Event;
pub use session::{presets, ExerciseDefinition, Phase, PhaseCycleEngine, Session, SessionStatus};
pub use storage::{Config, Database, UsageStore};
pub use usage::{CeilingCounter, QuotaDecision, QuotaPolicy, UsageWindow};
