use cadence_core::{presets, Config};

use super::CmdResult;
use crate::output::{phase_list, print_json};

pub fn run(json: bool) -> CmdResult {
    let config = Config::load_or_default();
    let mut exercises = config.exercises.clone();
    exercises.extend(
        presets::NAMES
            .iter()
            .filter(|name| !config.exercises.iter().any(|e| e.name == **name))
            .filter_map(|name| config.exercise(name)),
    );

    if json {
        print_json(&exercises)?;
        return Ok(0);
    }
    for exercise in &exercises {
        println!(
            "{:<12} {} x{} ({}s)",
            exercise.name,
            phase_list(exercise),
            exercise.cycles,
            exercise.total_duration_secs()
        );
    }
    Ok(0)
}
