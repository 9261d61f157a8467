mod definition;
mod engine;

pub use definition::{presets, ExerciseDefinition, Phase};
pub use engine::{PhaseCycleEngine, Session, SessionStatus};
