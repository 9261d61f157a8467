use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "cadence", version, about = "Cadence CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided breathing exercise
    Breathe(commands::breathe::BreatheArgs),
    /// Run a sleep timer that silences playback when it ends
    Sleep(commands::sleep::SleepArgs),
    /// List available exercises
    Presets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Chat message quota
    Quota {
        #[command(subcommand)]
        action: commands::quota::QuotaAction,
    },
    /// Call duration ceiling
    Call {
        #[command(subcommand)]
        action: commands::call::CallAction,
    },
    /// Completed session statistics
    Stats {
        /// Also list this many recent sessions
        #[arg(long, default_value = "0")]
        recent: usize,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Breathe(args) => commands::breathe::run(args),
        Commands::Sleep(args) => commands::sleep::run(args),
        Commands::Presets { json } => commands::presets::run(json),
        Commands::Quota { action } => commands::quota::run(action),
        Commands::Call { action } => commands::call::run(action),
        Commands::Stats { recent } => commands::stats::run(recent),
        Commands::Config { action } => commands::config::run(action),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
