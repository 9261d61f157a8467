mod config;
pub mod database;

pub use config::{BreathingConfig, CallConfig, ChatQuotaConfig, Config, SleepTimerConfig};
pub use database::{Database, SessionRecord, Stats, UsageStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml` and `cadence.db`.
///
/// `CADENCE_DATA_DIR` wins outright. Otherwise `~/.config/cadence[-dev]/`,
/// with the `-dev` suffix when `CADENCE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CADENCE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cadence-dev")
            } else {
                base_dir.join("cadence")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
