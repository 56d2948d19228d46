use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

use crate::error::{Result, ValError};
use crate::math::matrix::Matrix;

/// One mini-batch: `inputs` is (n × features), `targets` holds n 0/1 labels.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Matrix,
    pub targets: Vec<f64>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// In-memory, order-preserving batch iterator over a labelled dataset.
///
/// The final batch may be smaller than `batch_size`.
#[derive(Debug, Clone)]
pub struct DataLoader {
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
    batch_size: usize,
}

impl DataLoader {
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<f64>, batch_size: usize) -> Result<DataLoader> {
        if batch_size == 0 {
            return Err(ValError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if inputs.len() != targets.len() {
            return Err(ValError::shape(
                format!("{} targets", inputs.len()),
                format!("{} targets", targets.len()),
            ));
        }
        let width = inputs.first().map_or(0, Vec::len);
        if let Some(i) = inputs.iter().position(|row| row.len() != width) {
            return Err(ValError::shape(
                format!("{width} features"),
                format!("row {i} with {} features", inputs[i].len()),
            ));
        }
        Ok(DataLoader { inputs, targets, batch_size })
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.targets.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn num_samples(&self) -> usize {
        self.targets.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn iter(&self) -> impl Iterator<Item = Batch> + '_ {
        self.inputs.chunks(self.batch_size)
            .zip(self.targets.chunks(self.batch_size))
            .map(|(rows, targets)| Batch {
                inputs: Matrix {
                    rows: rows.len(),
                    cols: rows.first().map_or(0, Vec::len),
                    data: rows.to_vec(),
                },
                targets: targets.to_vec(),
            })
    }

    /// Seeded random sample of `size` rows without replacement, kept in
    /// their original order. `size` is clamped to the dataset size.
    pub fn subset(&self, size: usize, seed: u64) -> DataLoader {
        let n = self.num_samples();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked = sample(&mut rng, n, size.min(n)).into_vec();
        picked.sort_unstable();
        self.select(&picked)
    }

    /// Strided split: worker `rank` keeps rows `rank, rank + world_size, …`.
    pub fn shard(&self, rank: usize, world_size: usize) -> Result<DataLoader> {
        if world_size == 0 || rank >= world_size {
            return Err(ValError::InvalidConfig(format!(
                "rank {rank} out of range for world_size {world_size}"
            )));
        }
        let picked: Vec<usize> = (rank..self.num_samples()).step_by(world_size).collect();
        Ok(self.select(&picked))
    }

    fn select(&self, indices: &[usize]) -> DataLoader {
        DataLoader {
            inputs: indices.iter().map(|&i| self.inputs[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            batch_size: self.batch_size,
        }
    }
}
