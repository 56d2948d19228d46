use serde::{Serialize, Deserialize};

use crate::error::{Result, ValError};
use crate::loss::bce::BceLoss;
use crate::loss::bce_logits::BceWithLogitsLoss;

/// Selects the criterion applied to the model's logits.
///
/// - `BceWithLogits` : fused sigmoid + binary cross-entropy (default).
/// - `Bce`           : sigmoid first, then ε-clamped binary cross-entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    #[default]
    BceWithLogits,
    Bce,
}

impl LossType {
    /// Mean loss over all samples.
    pub fn loss(self, logits: &[f64], targets: &[f64]) -> Result<f64> {
        if logits.len() != targets.len() {
            return Err(ValError::shape(
                format!("{} targets", logits.len()),
                format!("{} targets", targets.len()),
            ));
        }
        if logits.is_empty() {
            return Err(ValError::EmptyDataset);
        }
        Ok(match self {
            LossType::BceWithLogits => BceWithLogitsLoss::loss(logits, targets),
            LossType::Bce           => BceLoss::loss(logits, targets),
        })
    }
}
