//! Live session runner shared by `breathe` and `sleep`.
//!
//! Wires a real-time [`Ticker`] to the engine and prints each event as it
//! happens. Ctrl+C closes the session.

use std::time::Duration;

use cadence_core::{Database, Event, ExerciseDefinition, PhaseCycleEngine, Ticker};
use chrono::Utc;
use tracing::{info, warn};

use crate::output::print_event;

pub struct RunOptions {
    pub json: bool,
    /// Tick period override in milliseconds; one second when unset.
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Interrupted,
}

pub fn run_session(
    definition: ExerciseDefinition,
    options: &RunOptions,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let ticker = match options.tick_ms {
        Some(ms) => Ticker::with_period(Duration::from_millis(ms)),
        None => Ticker::new(),
    };
    let mut engine = PhaseCycleEngine::new(ticker);

    let name = definition.name.clone();
    let total_secs = definition.total_duration_secs();
    let started_at = Utc::now();
    let outcome = runtime.block_on(drive(&mut engine, definition, options.json))?;

    if outcome == Outcome::Completed {
        let recorded = Database::open()
            .and_then(|db| db.record_session(&name, total_secs, started_at, Utc::now()));
        if let Err(e) = recorded {
            warn!("could not record completed session: {e}");
        }
    }
    Ok(outcome)
}

async fn drive(
    engine: &mut PhaseCycleEngine<Ticker>,
    definition: ExerciseDefinition,
    json: bool,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let cycles = definition.cycles;
    let started = engine.start(definition)?;
    print_event(&started, json, cycles)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            tick = engine.clock_mut().next_tick() => {
                if tick.is_none() {
                    break;
                }
                if let Some(event) = engine.tick() {
                    print_event(&event, json, cycles)?;
                    if matches!(event, Event::Completed { .. }) {
                        return Ok(Outcome::Completed);
                    }
                }
            }
            _ = &mut ctrl_c => {
                if let Some(snapshot) = engine.snapshot() {
                    print_event(&snapshot, json, cycles)?;
                }
                engine.close();
                info!("session interrupted");
                return Ok(Outcome::Interrupted);
            }
        }
    }

    Ok(if engine.is_completed() {
        Outcome::Completed
    } else {
        Outcome::Interrupted
    })
}
