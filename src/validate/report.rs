use serde::{Serialize, Deserialize};

use crate::tracking::EpochRecord;

/// Per-batch progress emitted by `val_epoch`.
///
/// Times are in seconds; every `*_avg` is the running average over the
/// batches seen so far in this epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    pub epoch: usize,
    /// 1-based batch number.
    pub batch: usize,
    pub total_batches: usize,
    pub batch_time: f64,
    pub batch_time_avg: f64,
    pub data_time: f64,
    pub data_time_avg: f64,
    pub loss: f64,
    pub loss_avg: f64,
    pub acc: f64,
    pub acc_avg: f64,
}

/// Outcome of one validation epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub epoch: usize,
    /// Criterion over every logit of the epoch at once.
    pub loss: f64,
    /// Accuracy at `threshold` (balanced unless disabled).
    pub acc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when only one class was present.
    pub auc: Option<f64>,
    /// Decision threshold that maximized F1.
    pub threshold: f64,
    /// Sample-weighted mean of the per-batch losses; global across workers
    /// when a collective was used.
    pub mean_batch_loss: f64,
    /// Sample-weighted mean of the per-batch accuracies; global across
    /// workers when a collective was used.
    pub mean_batch_acc: f64,
    pub samples: usize,
    pub batches: usize,
    pub world_size: usize,
    /// Wall-clock duration of the pass in milliseconds.
    pub elapsed_ms: u64,
}

impl ValidationReport {
    pub fn to_record(&self) -> EpochRecord {
        EpochRecord {
            epoch: self.epoch,
            loss: self.loss,
            acc: self.acc,
            precision: self.precision,
            recall: self.recall,
            f1: self.f1,
            auc: self.auc,
            threshold: self.threshold,
        }
    }
}
