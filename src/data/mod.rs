pub mod csv;
pub mod loader;

pub use loader::{Batch, DataLoader};
