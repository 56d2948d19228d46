pub mod config;
pub mod epoch;
pub mod report;

pub use config::{Sinks, ValidationConfig};
pub use epoch::{val_epoch, LATENT_TAG};
pub use report::{BatchProgress, ValidationReport};
