use crate::activation::activation::sigmoid;

pub struct BceLoss;

const EPS: f64 = 1e-12;

impl BceLoss {
    /// Scalar BCE on raw logits: p = σ(x), then -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    pub fn loss(logits: &[f64], expected: &[f64]) -> f64 {
        let n = logits.len() as f64;
        logits.iter().zip(expected.iter())
            .map(|(x, y)| {
                let p = sigmoid(*x);
                -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln())
            })
            .sum::<f64>() / n
    }
}
