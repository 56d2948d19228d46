use std::sync::mpsc;

use serde::{Serialize, Deserialize};

use crate::error::{Result, ValError};
use crate::loss::loss_type::LossType;
use crate::tracking::{EventWriter, MetricsLogger};
use crate::validate::report::BatchProgress;

/// File-loadable settings for a `val_epoch` run.
///
/// # Fields
/// - `loss`               : criterion applied to the logits
/// - `batch_size`         : rows per validation batch (used by the CLI loader)
/// - `batch_threshold`    : decision threshold for the per-batch accuracy
/// - `balanced`           : report balanced accuracy instead of plain accuracy
/// - `embedding_interval` : capture the latent space every N epochs; `0` disables
/// - `embedding_layer`    : name of the layer whose output is captured
/// - `subset_size`        : rows sampled for the latent-space subset
/// - `seed`               : seed for the subset sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub loss: LossType,
    pub batch_size: usize,
    pub batch_threshold: f64,
    pub balanced: bool,
    pub embedding_interval: usize,
    pub embedding_layer: String,
    pub subset_size: usize,
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            loss: LossType::BceWithLogits,
            batch_size: 32,
            batch_threshold: 0.5,
            balanced: true,
            embedding_interval: 10,
            embedding_layer: "fc".into(),
            subset_size: 256,
            seed: 0,
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ValError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.batch_threshold) {
            return Err(ValError::InvalidConfig(format!(
                "batch_threshold {} is outside [0, 1]",
                self.batch_threshold
            )));
        }
        if self.embedding_interval > 0 && self.embedding_layer.is_empty() {
            return Err(ValError::InvalidConfig("embedding_layer must not be empty".into()));
        }
        Ok(())
    }

    /// True when the latent space should be captured at `epoch`.
    pub fn embedding_due(&self, epoch: usize) -> bool {
        self.embedding_interval > 0 && epoch % self.embedding_interval == 0
    }

    /// Deserializes a config from a JSON file; absent fields keep their defaults.
    pub fn load_json(path: &str) -> Result<ValidationConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: ValidationConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

/// Optional outputs of a `val_epoch` run.
///
/// - `logger`      : receives one `EpochRecord` per epoch
/// - `events`      : receives scalars and, on embedding epochs, the latent space
/// - `progress_tx` : one `BatchProgress` per batch; a dropped receiver only
///                   stops the messages, never the pass
#[derive(Default)]
pub struct Sinks<'a> {
    pub logger: Option<&'a mut dyn MetricsLogger>,
    pub events: Option<&'a mut dyn EventWriter>,
    pub progress_tx: Option<mpsc::Sender<BatchProgress>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"loss": "bce", "embedding_interval": 5}"#).unwrap();
        assert_eq!(config.loss, LossType::Bce);
        assert_eq!(config.embedding_interval, 5);
        assert_eq!(config.embedding_layer, "fc");
        assert!(config.balanced);
    }

    #[test]
    fn test_embedding_due() {
        let config = ValidationConfig::default();
        assert!(config.embedding_due(0));
        assert!(!config.embedding_due(7));
        assert!(config.embedding_due(20));
        let off = ValidationConfig { embedding_interval: 0, ..ValidationConfig::default() };
        assert!(!off.embedding_due(0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = ValidationConfig { batch_threshold: 1.5, ..ValidationConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ValidationConfig { batch_size: 0, ..ValidationConfig::default() };
        assert!(bad.validate().is_err());
        let bad = ValidationConfig { embedding_layer: String::new(), ..ValidationConfig::default() };
        assert!(bad.validate().is_err());
    }
}
