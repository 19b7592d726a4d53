//! Engine configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{BulkError, Result};

/// Default number of operations dispatched concurrently per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default pause between batches, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Configuration for bulk runs.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct BulkConfig {
    /// Maximum number of operations in flight per batch.
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after each batch except the last, in milliseconds.
    #[builder(default = "DEFAULT_DELAY_MS")]
    #[serde(default = "default_delay_ms")]
    pub delay_between_batches_ms: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl BulkConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.batch_size == Some(0) {
            return Err("Batch size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl BulkConfig {
    /// Create a new config builder.
    pub fn builder() -> BulkConfigBuilder {
        BulkConfigBuilder::default()
    }

    /// Pause between batches as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_batches_ms)
    }

    /// Check a config that did not go through the builder (e.g. deserialized).
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BulkError::InvalidConfig {
                message: "Batch size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay_between_batches_ms: DEFAULT_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BulkConfig::builder()
            .batch_size(3usize)
            .delay_between_batches_ms(50u64)
            .build()
            .unwrap();

        assert_eq!(config.batch_size, 3);
        assert_eq!(config.delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_config_defaults() {
        let config = BulkConfig::builder().build().unwrap();
        assert_eq!(config, BulkConfig::default());
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.delay_between_batches_ms, 100);
    }

    #[test]
    fn test_config_rejects_zero_batch() {
        assert!(BulkConfig::builder().batch_size(0usize).build().is_err());

        let config = BulkConfig {
            batch_size: 0,
            delay_between_batches_ms: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(BulkError::InvalidConfig { .. })
        ));
    }
}
