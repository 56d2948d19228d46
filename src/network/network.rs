use crate::error::{Result, ValError};
use crate::network::spec::NetworkSpec;
use crate::{activation::activation::ActivationFunction, layers::dense::Layer, math::matrix::Matrix};
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        Network { layers }
    }

    /// Builds a freshly initialized network from an architecture description.
    pub fn from_spec(spec: &NetworkSpec) -> Network {
        let layers = spec.layers.iter()
            .map(|l| {
                let layer = Layer::new(l.size, l.input_size, l.activation.clone());
                match &l.name {
                    Some(name) => layer.named(name.clone()),
                    None => layer,
                }
            })
            .collect();
        Network { layers }
    }

    /// Position of the layer carrying `name`.
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name.as_deref() == Some(name))
    }

    /// Batch forward pass. Nothing is cached on the layers.
    pub fn forward(&self, inputs: &Matrix) -> Result<Matrix> {
        let mut current = inputs.clone();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Forward pass that also returns the output of the layer named `layer`.
    pub fn forward_with_activation(&self, inputs: &Matrix, layer: &str) -> Result<(Matrix, Matrix)> {
        let hook = self.layer_index(layer)
            .ok_or_else(|| ValError::UnknownLayer(layer.to_string()))?;
        let mut captured = Matrix::default();
        let mut current = inputs.clone();
        for (i, l) in self.layers.iter().enumerate() {
            current = l.forward(&current)?;
            if i == hook {
                captured = current.clone();
            }
        }
        Ok((current, captured))
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
