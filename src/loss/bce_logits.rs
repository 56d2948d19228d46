/// Binary cross-entropy fused with the sigmoid, computed on logits.
pub struct BceWithLogitsLoss;

impl BceWithLogitsLoss {
    /// Scalar loss: mean(max(x, 0) − x·y + ln(1 + e^{−|x|}))
    ///
    /// Algebraically equal to BCE(σ(x), y) but finite for any logit.
    pub fn loss(logits: &[f64], expected: &[f64]) -> f64 {
        let n = logits.len() as f64;
        logits.iter().zip(expected.iter())
            .map(|(x, y)| x.max(0.0) - x * y + (-x.abs()).exp().ln_1p())
            .sum::<f64>() / n
    }
}
