//! Phase-cycle engine.
//!
//! A tick-driven state machine. It counts whole seconds down through the
//! phases of an [`ExerciseDefinition`], repeating for the configured number
//! of cycles. The engine never sleeps: one call to `tick()` is one second,
//! and the attached [`Clock`] decides when those calls happen.
//!
//! ## State Transitions
//!
//! ```text
//! start -> Running <-> Paused
//!          Running -> Completed      (last phase of last cycle ran out)
//! any   -> reset -> Ready -> resume -> Running
//! any   -> close -> (no session)
//! ```
//!
//! ## Usage
//!
//! ```
//! use cadence_core::clock::ManualClock;
//! use cadence_core::session::{presets, PhaseCycleEngine};
//!
//! let mut engine = PhaseCycleEngine::new(ManualClock::new());
//! engine.start(presets::get("calm").unwrap()).unwrap();
//! while engine.clock_mut().fire().is_some() {
//!     if let Some(event) = engine.tick() {
//!         println!("{}", event.kind());
//!     }
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::definition::{ExerciseDefinition, Phase};
use crate::clock::{Clock, ManualClock};
use crate::error::{CoreError, Result};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Rewound by `reset()`; waiting for `resume()`.
    Ready,
    Running,
    Paused,
    /// Terminal until `reset()` or a new `start()`.
    Completed,
}

/// Mutable run state of one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    definition: ExerciseDefinition,
    current_phase_index: usize,
    /// 0-based, always `< definition.cycles`.
    current_cycle: u32,
    seconds_remaining_in_phase: u64,
    status: SessionStatus,
}

impl Session {
    /// Build the initial state for an already validated definition.
    fn begin(definition: ExerciseDefinition, status: SessionStatus) -> Self {
        let mut session = Self {
            definition,
            current_phase_index: 0,
            current_cycle: 0,
            seconds_remaining_in_phase: 0,
            status,
        };
        session.rewind();
        session
    }

    fn rewind(&mut self) {
        let first = self.definition.first_active_phase().unwrap_or(0);
        self.current_cycle = 0;
        self.enter(first);
    }

    fn enter(&mut self, index: usize) {
        self.current_phase_index = index;
        self.seconds_remaining_in_phase = self
            .definition
            .phases
            .get(index)
            .map(|p| p.duration_seconds)
            .unwrap_or(0);
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        &self.definition
    }

    pub fn current_phase_index(&self) -> usize {
        self.current_phase_index
    }

    pub fn current_phase(&self) -> &Phase {
        &self.definition.phases[self.current_phase_index]
    }

    pub fn current_cycle(&self) -> u32 {
        self.current_cycle
    }

    pub fn seconds_remaining_in_phase(&self) -> u64 {
        self.seconds_remaining_in_phase
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Seconds of the whole exercise already counted down.
    pub fn elapsed_secs(&self) -> u64 {
        if self.status == SessionStatus::Completed {
            return self.definition.total_duration_secs();
        }
        let phase_total = self.current_phase().duration_seconds;
        u64::from(self.current_cycle)
            .saturating_mul(self.definition.cycle_duration_secs())
            .saturating_add(self.definition.cumulative_secs(self.current_phase_index))
            .saturating_add(phase_total.saturating_sub(self.seconds_remaining_in_phase))
    }
}

/// Drives one [`Session`] at a time and proxies transitions to its clock.
#[derive(Debug)]
pub struct PhaseCycleEngine<C: Clock = ManualClock> {
    clock: C,
    session: Option<Session>,
}

impl<C: Clock> PhaseCycleEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            session: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(Session::status)
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(Session::running)
    }

    pub fn is_completed(&self) -> bool {
        self.status() == Some(SessionStatus::Completed)
    }

    pub fn definition(&self) -> Option<&ExerciseDefinition> {
        self.session.as_ref().map(Session::definition)
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.session.as_ref().map(Session::current_phase)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let Some(session) = &self.session else {
            return 0.0;
        };
        let total = session.current_phase().duration_seconds;
        if total == 0 {
            return 0.0;
        }
        1.0 - (session.seconds_remaining_in_phase as f64 / total as f64)
    }

    /// 0.0 .. 100.0 progress across every cycle.
    pub fn session_progress_pct(&self) -> f64 {
        let Some(session) = &self.session else {
            return 0.0;
        };
        let total = session.definition.total_duration_secs();
        if total == 0 {
            return 0.0;
        }
        (session.elapsed_secs() as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event, if a session is open.
    pub fn snapshot(&self) -> Option<Event> {
        let session = self.session.as_ref()?;
        let phase = session.current_phase();
        Some(Event::StateSnapshot {
            status: session.status,
            exercise: session.definition.name.clone(),
            phase_index: session.current_phase_index,
            phase_name: phase.name.clone(),
            cycle: session.current_cycle,
            cycles: session.definition.cycles,
            remaining_secs: session.seconds_remaining_in_phase,
            total_secs: phase.duration_seconds,
            session_progress_pct: self.session_progress_pct(),
            at: Utc::now(),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate `definition`, replace any open session and start the clock.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDefinition` when the definition has no
    /// phases, only zero-duration phases, or zero cycles. The engine is left
    /// untouched in that case.
    ///
    /// Returns `CoreError::ClockUnavailable` when the clock does not reach
    /// `Running`; any previously open session is discarded.
    pub fn start(&mut self, definition: ExerciseDefinition) -> Result<Event> {
        definition.validate()?;

        if self.session.is_some() {
            self.clock.stop();
        }
        let session = Session::begin(definition, SessionStatus::Running);
        let phase = session.current_phase();
        let event = Event::SessionStarted {
            exercise: session.definition.name.clone(),
            phase_index: session.current_phase_index,
            phase_name: phase.name.clone(),
            duration_secs: phase.duration_seconds,
            cycles: session.definition.cycles,
            at: Utc::now(),
        };
        self.clock.start();
        if !self.clock.is_running() {
            self.session = None;
            return Err(CoreError::ClockUnavailable);
        }
        info!(
            exercise = %session.definition.name,
            cycles = session.definition.cycles,
            "session started"
        );
        self.session = Some(session);
        Ok(event)
    }

    /// Count one second down. Returns the transition it caused, if any.
    ///
    /// A phase's last second elapses on the tick that brings its countdown
    /// to zero, so a 4-second phase lasts exactly four ticks. Does nothing
    /// unless the session is running.
    pub fn tick(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        if session.status != SessionStatus::Running {
            return None;
        }

        session.seconds_remaining_in_phase = session.seconds_remaining_in_phase.saturating_sub(1);
        if session.seconds_remaining_in_phase > 0 {
            return None;
        }

        let definition = &session.definition;
        let next = match definition.next_active_phase(session.current_phase_index) {
            Some(next) => next,
            None if session.current_cycle + 1 < definition.cycles => {
                session.current_cycle += 1;
                definition.first_active_phase().unwrap_or(0)
            }
            None => {
                session.status = SessionStatus::Completed;
                self.clock.stop();
                info!(exercise = %session.definition.name, "session completed");
                return Some(Event::Completed {
                    exercise: session.definition.name.clone(),
                    cycles: session.definition.cycles,
                    at: Utc::now(),
                });
            }
        };

        session.enter(next);
        let phase = session.current_phase();
        debug!(
            phase = %phase.name,
            cycle = session.current_cycle,
            "phase changed"
        );
        Some(Event::PhaseChanged {
            phase_index: next,
            phase_name: phase.name.clone(),
            duration_secs: phase.duration_seconds,
            cycle: session.current_cycle,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        if session.status != SessionStatus::Running {
            return None;
        }
        session.status = SessionStatus::Paused;
        self.clock.pause();
        debug!(remaining = session.seconds_remaining_in_phase, "session paused");
        Some(Event::PausedChanged {
            paused: true,
            remaining_secs: session.seconds_remaining_in_phase,
            at: Utc::now(),
        })
    }

    /// Continue a paused session, or begin a session rewound by `reset()`.
    pub fn resume(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        match session.status {
            SessionStatus::Paused => self.clock.resume(),
            SessionStatus::Ready => self.clock.start(),
            SessionStatus::Running | SessionStatus::Completed => return None,
        }
        session.status = SessionStatus::Running;
        debug!(remaining = session.seconds_remaining_in_phase, "session resumed");
        Some(Event::PausedChanged {
            paused: false,
            remaining_secs: session.seconds_remaining_in_phase,
            at: Utc::now(),
        })
    }

    /// Rewind to the first phase of the first cycle, keeping the definition.
    pub fn reset(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        session.rewind();
        session.status = SessionStatus::Ready;
        self.clock.stop();
        debug!(exercise = %session.definition.name, "session reset");
        Some(Event::Reset { at: Utc::now() })
    }

    /// Stop the clock and discard the session. Returns whether one was open.
    pub fn close(&mut self) -> bool {
        self.clock.stop();
        match self.session.take() {
            Some(session) => {
                info!(exercise = %session.definition.name, "session closed");
                true
            }
            None => false,
        }
    }
}

impl Default for PhaseCycleEngine<ManualClock> {
    fn default() -> Self {
        Self::new(ManualClock::new())
    }
}
