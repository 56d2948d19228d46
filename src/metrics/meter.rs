use serde::{Serialize, Deserialize};

/// Running weighted average of a scalar (loss, accuracy, timings).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageMeter {
    /// Most recent value passed to `update`.
    pub val: f64,
    pub sum: f64,
    pub count: f64,
    pub avg: f64,
}

impl AverageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records `val` observed over `n` samples.
    pub fn update(&mut self, val: f64, n: usize) {
        self.val = val;
        self.sum += val * n as f64;
        self.count += n as f64;
        self.avg = if self.count > 0.0 { self.sum / self.count } else { 0.0 };
    }

    /// Replaces the totals, e.g. with values summed across workers.
    pub fn set_totals(&mut self, sum: f64, count: f64) {
        self.sum = sum;
        self.count = count;
        self.avg = if count > 0.0 { sum / count } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average() {
        let mut m = AverageMeter::new();
        m.update(1.0, 3);
        m.update(0.0, 1);
        assert_eq!(m.val, 0.0);
        assert_eq!(m.count, 4.0);
        assert!((m.avg - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_set_totals_and_reset() {
        let mut m = AverageMeter::new();
        m.update(2.0, 2);
        m.set_totals(10.0, 8.0);
        assert_eq!(m.avg, 1.25);
        m.set_totals(0.0, 0.0);
        assert_eq!(m.avg, 0.0);
        m.reset();
        assert_eq!(m, AverageMeter::default());
    }
}
