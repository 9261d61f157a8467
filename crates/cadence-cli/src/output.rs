//! Terminal rendering of engine events.

use cadence_core::{Event, ExerciseDefinition};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One event per line: compact JSON, or a short human sentence.
pub fn print_event(event: &Event, json: bool, cycles: u32) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::SessionStarted {
            exercise,
            phase_name,
            duration_secs,
            ..
        } => println!("{exercise}: {phase_name} {duration_secs}s (cycle 1/{cycles})"),
        Event::PhaseChanged {
            phase_name,
            duration_secs,
            cycle,
            ..
        } => println!("{phase_name} {duration_secs}s (cycle {}/{cycles})", cycle + 1),
        Event::Completed { exercise, .. } => println!("{exercise}: complete"),
        Event::PausedChanged {
            paused,
            remaining_secs,
            ..
        } => {
            let verb = if *paused { "paused" } else { "resumed" };
            println!("{verb} ({remaining_secs}s left in phase)");
        }
        Event::Reset { .. } => println!("reset"),
        Event::StateSnapshot {
            phase_name,
            remaining_secs,
            session_progress_pct,
            ..
        } => println!("{phase_name}: {remaining_secs}s left, {session_progress_pct:.0}% done"),
    }
    Ok(())
}

/// `inhale:4,hold:0,exhale:8`
pub fn phase_list(definition: &ExerciseDefinition) -> String {
    definition
        .phases
        .iter()
        .map(|p| format!("{}:{}", p.name, p.duration_seconds))
        .collect::<Vec<_>>()
        .join(",")
}
