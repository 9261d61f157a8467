//! TOML-based application configuration.
//!
//! Stores the policies the adapters feed into the engine:
//! - Chat message quota (limit and rolling window length)
//! - Call duration ceiling
//! - Sleep timer default
//! - Breathing defaults and custom exercises
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::session::{presets, ExerciseDefinition};
use crate::usage::{CeilingCounter, QuotaPolicy};

/// Chat message quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatQuotaConfig {
    #[serde(default = "default_chat_limit")]
    pub limit: u32,
    /// Rolling window length. 0 turns the limit into a hard cap.
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
}

/// Call duration ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    #[serde(default = "default_call_limit")]
    pub limit_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepTimerConfig {
    #[serde(default = "default_sleep_minutes")]
    pub default_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_preset")]
    pub default_preset: String,
    /// Overrides the cycle count of built-in presets.
    #[serde(default)]
    pub cycles: Option<u32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chat_quota: ChatQuotaConfig,
    #[serde(default)]
    pub call: CallConfig,
    #[serde(default)]
    pub sleep_timer: SleepTimerConfig,
    #[serde(default)]
    pub breathing: BreathingConfig,
    /// User-defined exercises, looked up by name before the presets.
    #[serde(default)]
    pub exercises: Vec<ExerciseDefinition>,
}

fn default_chat_limit() -> u32 {
    30
}
fn default_window_hours() -> u64 {
    12
}
fn default_call_limit() -> u64 {
    600
}
fn default_sleep_minutes() -> u64 {
    30
}
fn default_preset() -> String {
    "calm".into()
}

impl Default for ChatQuotaConfig {
    fn default() -> Self {
        Self {
            limit: default_chat_limit(),
            window_hours: default_window_hours(),
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            limit_seconds: default_call_limit(),
        }
    }
}

impl Default for SleepTimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_sleep_minutes(),
        }
    }
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            cycles: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }
        let mut parts = key.split('.').peekable();

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                // Unset optionals accept a number, anything else stays text.
                serde_json::Value::Null => match value.parse::<u64>() {
                    Ok(n) => serde_json::Value::Number(n.into()),
                    Err(_) => serde_json::Value::String(value.into()),
                },
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Location of the config file.
    pub fn file_path() -> Result<PathBuf> {
        Self::path()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, keeping the existing value's type.
    ///
    /// Only updates the in-memory value; call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn chat_policy(&self) -> QuotaPolicy {
        if self.chat_quota.window_hours == 0 {
            QuotaPolicy::hard_cap(self.chat_quota.limit)
        } else {
            QuotaPolicy::rolling(self.chat_quota.limit, self.chat_quota.window_hours)
        }
    }

    /// A fresh call-duration counter.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDefinition` if `call.limit_seconds` is 0.
    pub fn call_ceiling(&self) -> Result<CeilingCounter> {
        CeilingCounter::new(self.call.limit_seconds).map_err(CoreError::from)
    }

    /// Look up an exercise: custom definitions first, then the presets.
    pub fn exercise(&self, name: &str) -> Option<ExerciseDefinition> {
        if let Some(custom) = self.exercises.iter().find(|e| e.name == name) {
            return Some(custom.clone());
        }
        let mut def = presets::get(name)?;
        if let Some(cycles) = self.breathing.cycles {
            def.cycles = cycles;
        }
        Some(def)
    }

    pub fn sleep_timer(&self, minutes: Option<u64>) -> ExerciseDefinition {
        let minutes = minutes.unwrap_or(self.sleep_timer.default_minutes);
        ExerciseDefinition::countdown("sleep", minutes.saturating_mul(60))
    }
}
