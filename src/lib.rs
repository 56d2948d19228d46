pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod data;
pub mod metrics;
pub mod distributed;
pub mod tracking;
pub mod validate;

// Convenience re-exports
pub use error::{Result, ValError};
pub use math::matrix::Matrix;
pub use activation::activation::{sigmoid, ActivationFunction};
pub use layers::dense::Layer;
pub use network::{Model, Network, NetworkSpec, LayerSpec};
pub use loss::loss_type::LossType;
pub use data::{Batch, DataLoader};
pub use metrics::{AverageMeter, ThresholdMetrics};
pub use distributed::{Collective, LocalGroup, ReduceOp, ThreadGroup, ThreadWorker};
pub use tracking::{EpochRecord, EventWriter, FileEventWriter, MetricsLogger, TsvLogger};
pub use validate::{val_epoch, BatchProgress, Sinks, ValidationConfig, ValidationReport};
