use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;

/// Non-resetting usage ceiling for one live session (e.g. call seconds).
///
/// The counter never stops anything itself; the caller advances it once per
/// tick of its own clock and decides what `is_exceeded` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeilingCounter {
    pub elapsed_seconds: u64,
    pub limit_seconds: u64,
}

impl CeilingCounter {
    /// # Errors
    /// Returns `DefinitionError::ZeroLimit` when `limit_seconds` is zero.
    pub fn new(limit_seconds: u64) -> Result<Self, DefinitionError> {
        if limit_seconds == 0 {
            return Err(DefinitionError::ZeroLimit);
        }
        Ok(Self {
            elapsed_seconds: 0,
            limit_seconds,
        })
    }

    #[must_use]
    pub fn advance(self, delta_seconds: u64) -> Self {
        advance(&self, delta_seconds)
    }

    pub fn is_exceeded(&self) -> bool {
        is_exceeded(self)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.limit_seconds.saturating_sub(self.elapsed_seconds)
    }
}

pub fn advance(counter: &CeilingCounter, delta_seconds: u64) -> CeilingCounter {
    CeilingCounter {
        elapsed_seconds: counter.elapsed_seconds.saturating_add(delta_seconds),
        ..*counter
    }
}

pub fn is_exceeded(counter: &CeilingCounter) -> bool {
    counter.elapsed_seconds >= counter.limit_seconds
}
