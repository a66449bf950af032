//! Import configuration, handed explicitly to the import entry point.

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};

/// Configuration of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Keep rows committed up to the last checkpoint when a later row fails.
    /// When disabled, any row failure fails the whole batch.
    pub partial_commit: bool,

    /// Number of rows between two flush/checkpoint operations
    pub flush_step: usize,
}

impl ImportConfig {
    /// Check the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidPattern`] when `flush_step` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.flush_step == 0 {
            return Err(PatternError::invalid_pattern(
                "flush_step must be greater or equal to 1",
            ));
        }
        Ok(())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            partial_commit: true,
            flush_step: 500,
        }
    }
}
