use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;

/// A named step with a fixed duration in whole seconds.
///
/// A zero-duration phase is never entered; it lets one definition shape
/// cover exercises with and without a hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub duration_seconds: u64,
}

impl Phase {
    pub fn new(name: impl Into<String>, duration_seconds: u64) -> Self {
        Self {
            name: name.into(),
            duration_seconds,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.duration_seconds == 0
    }
}

/// Parses `name:seconds`, e.g. `inhale:4`.
impl FromStr for Phase {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |message: &str| DefinitionError::BadPhaseSpec {
            input: s.to_string(),
            message: message.to_string(),
        };
        let (name, secs) = s.split_once(':').ok_or_else(|| bad("expected name:seconds"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(bad("phase name is empty"));
        }
        let duration_seconds = secs
            .trim()
            .parse::<u64>()
            .map_err(|e| bad(&e.to_string()))?;
        Ok(Phase::new(name, duration_seconds))
    }
}

/// Ordered phases plus a repeat count. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    /// Display label; not used by the engine.
    #[serde(default)]
    pub name: String,
    pub phases: Vec<Phase>,
    pub cycles: u32,
}

impl ExerciseDefinition {
    pub fn new(name: impl Into<String>, phases: Vec<Phase>, cycles: u32) -> Self {
        Self {
            name: name.into(),
            phases,
            cycles,
        }
    }

    /// A single-phase, single-cycle countdown (sleep timers).
    pub fn countdown(label: impl Into<String>, seconds: u64) -> Self {
        let label = label.into();
        Self::new(label.clone(), vec![Phase::new(label, seconds)], 1)
    }

    /// Parse a comma-separated phase list: `inhale:4,hold:0,exhale:8`.
    pub fn parse_phases(spec: &str) -> Result<Vec<Phase>, DefinitionError> {
        spec.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.parse::<Phase>())
            .collect()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.phases.is_empty() {
            return Err(DefinitionError::NoPhases);
        }
        if self.phases.iter().all(Phase::is_skipped) {
            return Err(DefinitionError::AllPhasesEmpty);
        }
        if self.cycles < 1 {
            return Err(DefinitionError::ZeroCycles(self.cycles));
        }
        Ok(())
    }

    /// Index of the first phase that is actually entered.
    pub fn first_active_phase(&self) -> Option<usize> {
        self.phases.iter().position(|p| !p.is_skipped())
    }

    /// Next entered phase strictly after `index` within the same cycle.
    pub fn next_active_phase(&self, index: usize) -> Option<usize> {
        self.phases
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, p)| !p.is_skipped())
            .map(|(i, _)| i)
    }

    pub fn active_phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(|p| !p.is_skipped())
    }

    pub fn cycle_duration_secs(&self) -> u64 {
        self.phases
            .iter()
            .map(|p| p.duration_seconds)
            .fold(0u64, u64::saturating_add)
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.cycle_duration_secs().saturating_mul(u64::from(self.cycles))
    }

    /// Seconds in the phases before `index` in one cycle.
    pub fn cumulative_secs(&self, index: usize) -> u64 {
        self.phases
            .iter()
            .take(index)
            .map(|p| p.duration_seconds)
            .fold(0u64, u64::saturating_add)
    }
}

/// Built-in breathing exercises.
pub mod presets {
    use super::{ExerciseDefinition, Phase};

    pub const NAMES: [&str; 4] = ["calm", "box", "relax-478", "coherent"];

    pub fn get(name: &str) -> Option<ExerciseDefinition> {
        let def = match name {
            "calm" => ExerciseDefinition::new(
                "calm",
                vec![
                    Phase::new("inhale", 4),
                    Phase::new("hold", 0),
                    Phase::new("exhale", 8),
                ],
                4,
            ),
            "box" => ExerciseDefinition::new(
                "box",
                vec![
                    Phase::new("inhale", 4),
                    Phase::new("hold", 4),
                    Phase::new("exhale", 4),
                    Phase::new("hold", 4),
                ],
                4,
            ),
            "relax-478" => ExerciseDefinition::new(
                "relax-478",
                vec![
                    Phase::new("inhale", 4),
                    Phase::new("hold", 7),
                    Phase::new("exhale", 8),
                ],
                4,
            ),
            "coherent" => ExerciseDefinition::new(
                "coherent",
                vec![Phase::new("inhale", 5), Phase::new("exhale", 5)],
                6,
            ),
            _ => return None,
        };
        Some(def)
    }

    pub fn all() -> Vec<ExerciseDefinition> {
        NAMES.iter().filter_map(|name| get(name)).collect()
    }
}
