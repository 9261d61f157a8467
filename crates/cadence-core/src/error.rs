//! Core error types for cadence-core.
//!
//! Only malformed configuration is an error here. Running out of quota or
//! crossing a ceiling is reported through ordinary return values.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cadence-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An exercise definition or counter limit was rejected at construction.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session's clock could not start, e.g. a `Ticker` outside a tokio
    /// runtime.
    #[error("Clock failed to start")]
    ClockUnavailable,

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons an exercise definition (or ceiling limit) is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("exercise has no phases")]
    NoPhases,

    #[error("every phase has a zero duration")]
    AllPhasesEmpty,

    #[error("cycles must be at least 1, got {0}")]
    ZeroCycles(u32),

    #[error("ceiling limit must be positive")]
    ZeroLimit,

    /// A textual phase list (`inhale:4,exhale:8`) could not be parsed.
    #[error("cannot parse phase '{input}': {message}")]
    BadPhaseSpec { input: String, message: String },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored record could not be decoded
    #[error("Corrupt record under key '{key}': {message}")]
    CorruptRecord { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
