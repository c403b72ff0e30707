//! Tracker configuration.
//!
//! The only tunable is the size of the history. Applications usually embed
//! [`TrackerConfig`] in their own settings and deserialize it from JSON:
//!
//! ```
//! use meditor::config::TrackerConfig;
//!
//! let config: TrackerConfig =
//!     serde_json::from_str(r#"{ "max_transaction_stack_size": 50 }"#).unwrap();
//! assert_eq!(config.max_transaction_stack_size(), 50);
//! ```

use serde::{Deserialize, Serialize};

/// Maximum number of transactions that can be pushed to the log before the
/// oldest ones start to be discarded.
pub const MAX_TRANSACTION_STACK_SIZE: usize = 500;

/// Smallest history that still retains a transaction after an eviction.
const MIN_TRANSACTION_STACK_SIZE: usize = 2;

/// Error returned when building an invalid [`TrackerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The history would evict every transaction as soon as it is recorded.
    #[error("transaction stack size {0} is below the minimum of {MIN_TRANSACTION_STACK_SIZE}")]
    StackTooSmall(usize),
}

/// Configuration of a [`Tracker`](crate::transaction::Tracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTrackerConfig")]
pub struct TrackerConfig {
    max_transaction_stack_size: usize,
}

impl TrackerConfig {
    /// Creates a configuration with the given history bound.
    pub fn new(max_transaction_stack_size: usize) -> Result<Self, ConfigError> {
        if max_transaction_stack_size < MIN_TRANSACTION_STACK_SIZE {
            return Err(ConfigError::StackTooSmall(max_transaction_stack_size));
        }
        Ok(Self {
            max_transaction_stack_size,
        })
    }

    /// The length at which the log starts evicting its oldest transaction.
    pub fn max_transaction_stack_size(&self) -> usize {
        self.max_transaction_stack_size
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_transaction_stack_size: MAX_TRANSACTION_STACK_SIZE,
        }
    }
}

// Deserialization goes through `new` so that the bound is validated.
#[derive(Deserialize)]
struct RawTrackerConfig {
    #[serde(default = "default_stack_size")]
    max_transaction_stack_size: usize,
}

fn default_stack_size() -> usize {
    MAX_TRANSACTION_STACK_SIZE
}

impl TryFrom<RawTrackerConfig> for TrackerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawTrackerConfig) -> Result<Self, Self::Error> {
        Self::new(raw.max_transaction_stack_size)
    }
}
