pub mod breathe;
pub mod call;
pub mod config;
pub mod presets;
pub mod quota;
pub mod session;
pub mod sleep;
pub mod stats;

/// Handler result: the process exit code, or an error printed by `main`.
pub type CmdResult = Result<i32, Box<dyn std::error::Error>>;

/// Exit code for "refused by quota/ceiling", distinct from errors.
pub const EXIT_LIMIT_REACHED: i32 = 2;
