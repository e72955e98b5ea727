//! Feature model configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What happens to stored values when the topology drops their entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Keep values of removed entities until the namespace is cleared or
    /// `FeatureModel::prune_stale` runs.
    #[default]
    Retain,
    /// Drop an entity's values when the topology owner reports its removal.
    Evict,
}

/// Construction-time settings for a `FeatureModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureModelConfig {
    pub stale_values: StalePolicy,
    /// Shard count of each value store. `None` lets `dashmap` pick from the
    /// CPU count.
    pub shard_amount: Option<usize>,
    /// Entities to reserve room for in each value store.
    pub initial_capacity: usize,
}

impl Default for FeatureModelConfig {
    fn default() -> Self {
        Self {
            stale_values: StalePolicy::Retain,
            shard_amount: None,
            initial_capacity: 0,
        }
    }
}

impl FeatureModelConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(Error::Config(format!(
                    "shard_amount must be a power of two greater than 1, got {shards}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
