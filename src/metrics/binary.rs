//! Threshold-dependent and threshold-independent metrics for a single
//! probability per sample.
//!
//! A sample counts as a positive target when `target >= 0.5` and as a
//! positive prediction when `prob >= threshold`.

use serde::{Serialize, Deserialize};

/// Threshold used when no better one can be derived.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

fn is_positive(target: f64) -> bool {
    target >= 0.5
}

/// 2×2 confusion counts at a fixed decision threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn at_threshold(probs: &[f64], targets: &[f64], threshold: f64) -> Self {
        let mut c = ConfusionCounts::default();
        for (&p, &y) in probs.iter().zip(targets) {
            match (p >= threshold, is_positive(y)) {
                (true, true)   => c.tp += 1,
                (true, false)  => c.fp += 1,
                (false, false) => c.tn += 1,
                (false, true)  => c.fn_ += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Mean per-class recall over the classes actually present.
    pub fn balanced_accuracy(&self) -> f64 {
        let positives = self.tp + self.fn_;
        let negatives = self.tn + self.fp;
        let rates: Vec<f64> = [
            (positives > 0).then(|| ratio(self.tp, positives)),
            (negatives > 0).then(|| ratio(self.tn, negatives)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if rates.is_empty() {
            0.0
        } else {
            rates.iter().sum::<f64>() / rates.len() as f64
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Accuracy at `threshold`; balanced accuracy when `balanced` is set.
pub fn accuracy_binary(probs: &[f64], targets: &[f64], threshold: f64, balanced: bool) -> f64 {
    let counts = ConfusionCounts::at_threshold(probs, targets, threshold);
    if balanced { counts.balanced_accuracy() } else { counts.accuracy() }
}

/// Precision, recall and F1 at the threshold that maximizes F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub threshold: f64,
}

/// Sweeps every distinct score as a threshold and keeps the best F1.
///
/// Ties keep the higher threshold. Without positive targets every score
/// is zero and the threshold falls back to [`DEFAULT_THRESHOLD`].
pub fn precision_recall_binary(probs: &[f64], targets: &[f64]) -> ThresholdMetrics {
    let total_pos = targets.iter().filter(|&&y| is_positive(y)).count();
    let fallback = ThresholdMetrics {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
        threshold: DEFAULT_THRESHOLD,
    };
    if total_pos == 0 {
        return fallback;
    }

    let mut order: Vec<usize> = (0..probs.len().min(targets.len())).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    let mut best: Option<ThresholdMetrics> = None;
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < order.len() {
        let threshold = probs[order[i]];
        // Everything scoring exactly `threshold` flips to positive together.
        // `total_cmp` keeps a NaN score in a group of its own.
        while i < order.len() && probs[order[i]].total_cmp(&threshold).is_eq() {
            if is_positive(targets[order[i]]) { tp += 1 } else { fp += 1 }
            i += 1;
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, total_pos);
        let candidate = ThresholdMetrics { precision, recall, f1: f1(precision, recall), threshold };
        if best.map_or(true, |b| candidate.f1 > b.f1) {
            best = Some(candidate);
        }
    }
    best.unwrap_or(fallback)
}

/// Area under the ROC curve via the rank-sum statistic; tied scores share
/// their average rank. `None` when only one class is present.
pub fn roc_auc(probs: &[f64], targets: &[f64]) -> Option<f64> {
    let n = probs.len().min(targets.len());
    let positives = targets[..n].iter().filter(|&&y| is_positive(y)).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| probs[a].total_cmp(&probs[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && probs[order[j]].total_cmp(&probs[order[i]]).is_eq() {
            j += 1;
        }
        // 1-based ranks i+1 ..= j share their mean.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        let tied_pos = order[i..j].iter().filter(|&&k| is_positive(targets[k])).count();
        positive_rank_sum += avg_rank * tied_pos as f64;
        i = j;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_confusion_counts() {
        let probs = [0.9, 0.6, 0.4, 0.1, 0.5];
        let targets = [1.0, 0.0, 1.0, 0.0, 1.0];
        let c = ConfusionCounts::at_threshold(&probs, &targets, 0.5);
        assert_eq!(c, ConfusionCounts { tp: 2, fp: 1, tn: 1, fn_: 1 });
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn test_balanced_accuracy_vs_plain() {
        // 3 negatives all right, 1 positive missed.
        let probs = [0.1, 0.2, 0.3, 0.4];
        let targets = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(accuracy_binary(&probs, &targets, 0.5, false), 0.75);
        assert_eq!(accuracy_binary(&probs, &targets, 0.5, true), 0.5);
    }

    #[test]
    fn test_balanced_accuracy_single_class() {
        let probs = [0.9, 0.2];
        let targets = [1.0, 1.0];
        assert_eq!(accuracy_binary(&probs, &targets, 0.5, true), 0.5);
    }

    #[test]
    fn test_precision_recall_picks_best_f1() {
        let probs = [0.95, 0.8, 0.7, 0.3, 0.2];
        let targets = [1.0, 1.0, 0.0, 1.0, 0.0];
        let m = precision_recall_binary(&probs, &targets);
        // t=0.8 → P=1, R=2/3, F1=0.8; t=0.3 → P=0.75, R=1, F1≈0.857
        assert_eq!(m.threshold, 0.3);
        assert_eq!(m.precision, 0.75);
        assert_eq!(m.recall, 1.0);
        assert!((m.f1 - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_recall_tie_keeps_higher_threshold() {
        let probs = [0.9, 0.5, 0.4];
        let targets = [1.0, 0.0, 1.0];
        // t=0.9: P=1, R=1/2 → F1=2/3. t=0.4: P=2/3, R=1 → F1=0.8.
        assert_eq!(precision_recall_binary(&probs, &targets).threshold, 0.4);

        let probs = [0.9, 0.8, 0.7, 0.6];
        let targets = [1.0, 0.0, 0.0, 1.0];
        // t=0.9: P=1, R=1/2 → 2/3. t=0.6: P=1/2, R=1 → 2/3. Tie → 0.9.
        assert_eq!(precision_recall_binary(&probs, &targets).threshold, 0.9);
    }

    #[test]
    fn test_precision_recall_without_positives() {
        let m = precision_recall_binary(&[0.2, 0.7], &[0.0, 0.0]);
        assert_eq!(m, ThresholdMetrics { precision: 0.0, recall: 0.0, f1: 0.0, threshold: 0.5 });
    }

    #[test]
    fn test_roc_auc() {
        assert_eq!(roc_auc(&[0.1, 0.4, 0.35, 0.8], &[0.0, 0.0, 1.0, 1.0]), Some(0.75));
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &[0.0, 0.0, 1.0, 1.0]), Some(1.0));
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &[0.0, 0.0, 1.0, 1.0]), Some(0.0));
    }

    #[test]
    fn test_roc_auc_ties_and_single_class() {
        assert_eq!(roc_auc(&[0.5, 0.5, 0.5, 0.5], &[0.0, 1.0, 0.0, 1.0]), Some(0.5));
        assert_eq!(roc_auc(&[0.3, 0.6], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_precision_recall_terminates_on_nan_score() {
        let m = precision_recall_binary(&[0.9, f64::NAN, 0.2], &[1.0, 0.0, 1.0]);
        // NaN sorts above every score: t=NaN → F1=0, t=0.9 → 1/2, t=0.2 → 0.8.
        assert_eq!(m.threshold, 0.2);
        assert!((m.f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_terminates_on_nan_score() {
        // The NaN negative ranks last, above both positives.
        assert_eq!(roc_auc(&[0.9, f64::NAN, 0.2], &[1.0, 0.0, 1.0]), Some(0.0));
        assert_eq!(roc_auc(&[f64::NAN, f64::NAN, 0.4], &[1.0, 0.0, 0.0]), Some(0.75));
    }
}
