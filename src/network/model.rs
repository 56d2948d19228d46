use crate::error::{Result, ValError};
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// A binary classifier as seen by the validation pass.
///
/// `forward` returns one logit per input row. `latent` returns the output
/// of an internal layer for the same rows, used for embedding snapshots.
pub trait Model {
    fn forward(&self, inputs: &Matrix) -> Result<Vec<f64>>;

    fn latent(&self, inputs: &Matrix, layer: &str) -> Result<Matrix>;
}

impl Model for Network {
    fn forward(&self, inputs: &Matrix) -> Result<Vec<f64>> {
        logits(Network::forward(self, inputs)?)
    }

    fn latent(&self, inputs: &Matrix, layer: &str) -> Result<Matrix> {
        let (_, latent) = self.forward_with_activation(inputs, layer)?;
        Ok(latent)
    }
}

/// Flattens an (N × 1) output into N logits.
fn logits(output: Matrix) -> Result<Vec<f64>> {
    if output.rows > 0 && output.cols != 1 {
        return Err(ValError::shape("1 output column", format!("{} output columns", output.cols)));
    }
    Ok(output.data.into_iter().filter_map(|row| row.first().copied()).collect())
}
