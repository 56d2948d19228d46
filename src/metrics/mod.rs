pub mod binary;
pub mod meter;

pub use binary::{
    accuracy_binary, precision_recall_binary, roc_auc, ConfusionCounts, ThresholdMetrics,
    DEFAULT_THRESHOLD,
};
pub use meter::AverageMeter;
