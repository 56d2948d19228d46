use serde::{Serialize, Deserialize};

use crate::error::{Result, ValError};
use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Inference-only dense layer: `y = act(x·W + b)`.
///
/// `weights` is stored input-major (input_size × size) and `biases` is 1 × size.
/// `forward` takes `&self`, so running a validation pass can never touch
/// the parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Optional handle used to capture this layer's output (e.g. `"fc"`).
    #[serde(default)]
    pub name: Option<String>,
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            name: None,
            size,
            weights: Matrix::xavier(input_size, size),
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Layer {
        self.name = Some(name.into());
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Batch forward: `inputs` is (batch × input_size), result is (batch × size).
    pub fn forward(&self, inputs: &Matrix) -> Result<Matrix> {
        if inputs.cols != self.input_size() {
            return Err(ValError::shape(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.cols),
            ));
        }
        let z = inputs.matmul(&self.weights)?.add_row(&self.biases)?;
        Ok(z.map(|x| self.activator.function(x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer() -> Layer {
        Layer {
            name: Some("fc".into()),
            size: 2,
            weights: Matrix::from_data(vec![vec![1.0, -1.0], vec![0.5, 2.0]]).unwrap(),
            biases: Matrix::from_data(vec![vec![0.0, -10.0]]).unwrap(),
            activator: ActivationFunction::ReLU,
        }
    }

    #[test]
    fn test_forward_applies_weights_bias_and_activation() {
        let layer = fixed_layer();
        let x = Matrix::from_data(vec![vec![2.0, 2.0]]).unwrap();
        let y = layer.forward(&x).unwrap();
        // z = [2 + 1, -2 + 4 - 10] = [3, -8]
        assert_eq!(y.row(0), &[3.0, 0.0]);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let layer = fixed_layer();
        let x = Matrix::zeros(1, 3);
        assert!(matches!(layer.forward(&x), Err(ValError::ShapeMismatch { .. })));
    }
}
