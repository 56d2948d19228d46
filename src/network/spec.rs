use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::error::{Result, ValError};
use crate::loss::loss_type::LossType;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`       : number of neurons in this layer
/// - `input_size` : number of neurons feeding into this layer (i.e. the output
///                  size of the previous layer, or the raw input dimension for
///                  the first layer)
/// - `activation` : activation function applied after the linear transform
/// - `name`       : optional handle, used to pick the embedding layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub name: Option<String>,
}

/// A serializable description of a binary classifier's architecture plus
/// the criterion it is validated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Criterion paired with this network.
    #[serde(default)]
    pub loss: LossType,
}

impl NetworkSpec {
    /// Checks that layers chain together and end in a single logit.
    pub fn validate(&self) -> Result<()> {
        let last = self.layers.last()
            .ok_or_else(|| ValError::InvalidConfig(format!("spec '{}' has no layers", self.name)))?;
        for pair in self.layers.windows(2) {
            if pair[1].input_size != pair[0].size {
                return Err(ValError::shape(
                    format!("input_size {}", pair[0].size),
                    format!("input_size {}", pair[1].input_size),
                ));
            }
        }
        if last.size != 1 {
            return Err(ValError::shape("1 output logit", format!("{} outputs", last.size)));
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
