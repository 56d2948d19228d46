//! Collective reduction across validation workers.
//!
//! [`Collective`] is the seam the validation pass talks to. [`LocalGroup`]
//! is the single-process case and [`ThreadGroup`] runs one worker per thread
//! inside the same process.

use std::sync::{Arc, Barrier, Mutex};

use serde::{Serialize, Deserialize};

use crate::error::{Result, ValError};

/// Element-wise reduction applied by `all_reduce`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    Sum,
    Max,
    Min,
}

impl ReduceOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Max => a.max(b),
            ReduceOp::Min => a.min(b),
        }
    }
}

pub trait Collective {
    fn rank(&self) -> usize;

    fn world_size(&self) -> usize;

    /// Reduces `buf` element-wise across all workers; every worker ends up
    /// holding the same result.
    fn all_reduce(&self, buf: &mut [f64], op: ReduceOp) -> Result<()>;
}

/// A group of one: reductions leave the buffer untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalGroup;

impl Collective for LocalGroup {
    fn rank(&self) -> usize {
        0
    }

    fn world_size(&self) -> usize {
        1
    }

    fn all_reduce(&self, _buf: &mut [f64], _op: ReduceOp) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Round {
    values: Option<Vec<f64>>,
    op: Option<ReduceOp>,
    mismatch: Option<String>,
}

impl Round {
    fn contribute(&mut self, buf: &[f64], op: ReduceOp) {
        let Some(values) = self.values.as_mut() else {
            self.values = Some(buf.to_vec());
            self.op = Some(op);
            return;
        };
        if values.len() != buf.len() || self.op != Some(op) {
            let reason = format!(
                "workers disagree: {} values / {:?} vs {} values / {:?}",
                values.len(), self.op, buf.len(), op
            );
            self.mismatch.get_or_insert(reason);
            return;
        }
        for (acc, &x) in values.iter_mut().zip(buf) {
            *acc = op.apply(*acc, x);
        }
    }

    fn read_into(&self, buf: &mut [f64]) -> Result<()> {
        if let Some(reason) = &self.mismatch {
            return Err(ValError::Collective(reason.clone()));
        }
        match &self.values {
            Some(values) if values.len() == buf.len() => {
                buf.copy_from_slice(values);
                Ok(())
            }
            _ => Err(ValError::Collective("reduction produced no result".into())),
        }
    }
}

#[derive(Debug)]
struct Shared {
    world_size: usize,
    barrier: Barrier,
    round: Mutex<Round>,
}

/// In-process worker group; each [`ThreadWorker`] is meant to live on its
/// own thread.
pub struct ThreadGroup;

impl ThreadGroup {
    /// Creates `world_size` connected workers, ranked `0..world_size`.
    pub fn new(world_size: usize) -> Result<Vec<ThreadWorker>> {
        if world_size == 0 {
            return Err(ValError::InvalidConfig("world_size must be > 0".into()));
        }
        let shared = Arc::new(Shared {
            world_size,
            barrier: Barrier::new(world_size),
            round: Mutex::new(Round::default()),
        });
        Ok((0..world_size)
            .map(|rank| ThreadWorker { rank, shared: Arc::clone(&shared) })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct ThreadWorker {
    rank: usize,
    shared: Arc<Shared>,
}

impl ThreadWorker {
    fn with_round<T>(&self, f: impl FnOnce(&mut Round) -> T) -> Result<T> {
        let mut round = self.shared.round.lock()
            .map_err(|_| ValError::Collective("reduction state poisoned".into()))?;
        Ok(f(&mut round))
    }
}

impl Collective for ThreadWorker {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.shared.world_size
    }

    fn all_reduce(&self, buf: &mut [f64], op: ReduceOp) -> Result<()> {
        // Three phases: reset, contribute, read. Every worker passes every
        // barrier even on error so no peer is left waiting.
        let reset = if self.shared.barrier.wait().is_leader() {
            self.with_round(|r| *r = Round::default())
        } else {
            Ok(())
        };
        self.shared.barrier.wait();
        let contributed = self.with_round(|r| r.contribute(buf, op));
        self.shared.barrier.wait();
        let read = self.with_round(|r| r.read_into(buf));

        reset?;
        contributed?;
        read?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_local_group_is_identity() {
        let mut buf = [1.0, 2.0];
        LocalGroup.all_reduce(&mut buf, ReduceOp::Sum).unwrap();
        assert_eq!(buf, [1.0, 2.0]);
        assert_eq!(LocalGroup.world_size(), 1);
    }

    #[test]
    fn test_thread_group_sum_over_several_rounds() {
        let workers = ThreadGroup::new(4).unwrap();
        let results: Vec<Vec<f64>> = thread::scope(|s| {
            let handles: Vec<_> = workers.iter().map(|w| {
                s.spawn(move || {
                    let mut out = Vec::new();
                    for round in 0..3 {
                        let mut buf = vec![w.rank() as f64, 1.0, round as f64];
                        w.all_reduce(&mut buf, ReduceOp::Sum).unwrap();
                        out.extend(buf);
                    }
                    out
                })
            }).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for r in &results {
            assert_eq!(r, &vec![6.0, 4.0, 0.0, 6.0, 4.0, 4.0, 6.0, 4.0, 8.0]);
        }
    }

    #[test]
    fn test_thread_group_max() {
        let workers = ThreadGroup::new(3).unwrap();
        thread::scope(|s| {
            for w in &workers {
                s.spawn(move || {
                    let mut buf = [w.rank() as f64 * 2.0];
                    w.all_reduce(&mut buf, ReduceOp::Max).unwrap();
                    assert_eq!(buf, [4.0]);
                });
            }
        });
    }

    #[test]
    fn test_length_mismatch_errors_everywhere() {
        let workers = ThreadGroup::new(2).unwrap();
        let errors = thread::scope(|s| {
            let handles: Vec<_> = workers.iter().map(|w| {
                s.spawn(move || {
                    let mut buf = vec![1.0; 2 + w.rank()];
                    w.all_reduce(&mut buf, ReduceOp::Sum).is_err()
                })
            }).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });
        assert_eq!(errors, vec![true, true]);
    }

    #[test]
    fn test_zero_world_size() {
        assert!(ThreadGroup::new(0).is_err());
    }
}
