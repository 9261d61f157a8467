use cadence_core::{Config, ExerciseDefinition};
use clap::Args;

use super::session::{run_session, Outcome, RunOptions};
use super::CmdResult;

#[derive(Args)]
pub struct BreatheArgs {
    /// Built-in or configured exercise name (defaults to breathing.default_preset)
    #[arg(long, conflicts_with = "phases")]
    pub preset: Option<String>,
    /// Ad-hoc phases, e.g. "inhale:4,hold:0,exhale:8"
    #[arg(long)]
    pub phases: Option<String>,
    /// Number of cycles
    #[arg(long)]
    pub cycles: Option<u32>,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
    /// Tick period in milliseconds
    #[arg(long, hide = true)]
    pub tick_ms: Option<u64>,
}

fn resolve(args: &BreatheArgs, config: &Config) -> Result<ExerciseDefinition, Box<dyn std::error::Error>> {
    let mut definition = match &args.phases {
        Some(spec) => ExerciseDefinition::new("custom", ExerciseDefinition::parse_phases(spec)?, 1),
        None => {
            let name = args
                .preset
                .as_deref()
                .unwrap_or(&config.breathing.default_preset);
            config
                .exercise(name)
                .ok_or_else(|| format!("unknown exercise: {name}"))?
        }
    };
    if let Some(cycles) = args.cycles {
        definition.cycles = cycles;
    }
    Ok(definition)
}

pub fn run(args: BreatheArgs) -> CmdResult {
    let config = Config::load_or_default();
    let definition = resolve(&args, &config)?;
    let options = RunOptions {
        json: args.json,
        tick_ms: args.tick_ms,
    };

    match run_session(definition, &options)? {
        Outcome::Completed => Ok(0),
        Outcome::Interrupted => Ok(130),
    }
}
