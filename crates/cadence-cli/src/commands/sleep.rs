use cadence_core::Config;
use clap::Args;

use super::session::{run_session, Outcome, RunOptions};
use super::CmdResult;

#[derive(Args)]
pub struct SleepArgs {
    /// Timer length in minutes (defaults to sleep_timer.default_minutes)
    #[arg(long)]
    pub minutes: Option<u64>,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
    /// Tick period in milliseconds
    #[arg(long, hide = true)]
    pub tick_ms: Option<u64>,
}

pub fn run(args: SleepArgs) -> CmdResult {
    let config = Config::load_or_default();
    let definition = config.sleep_timer(args.minutes);
    let options = RunOptions {
        json: args.json,
        tick_ms: args.tick_ms,
    };

    // Playback belongs to whoever started the soundscape; we only announce.
    match run_session(definition, &options)? {
        Outcome::Completed => {
            if !args.json {
                println!("playback stopped");
            }
            Ok(0)
        }
        Outcome::Interrupted => {
            if !args.json {
                println!("sleep timer cancelled");
            }
            Ok(130)
        }
    }
}
