pub mod events;
pub mod logger;

pub use events::{EventWriter, FileEventWriter, ScalarEvent};
pub use logger::{EpochRecord, MetricsLogger, TsvLogger, EPOCH_LOG_HEADER};
