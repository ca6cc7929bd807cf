use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use std::path::Path;
use tracing::info;

use crate::activation::activation::ActivationFunction;
use crate::device::Device;
use crate::error::Result;
use crate::layers::{flatten::Flatten, linear::Linear, stage::Stage};
use crate::math::tensor::checked_numel;
use crate::network::sequential::Sequential;

fn default_start_dim() -> usize {
    1
}

/// Describes one stage of a network specification.
///
/// Serialized as a tagged object, e.g.
/// `{"type": "linear", "in_features": 784, "out_features": 20}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Flatten {
        #[serde(default = "default_start_dim")]
        start_dim: usize,
    },
    Linear {
        in_features: usize,
        out_features: usize,
    },
    Activation {
        function: ActivationFunction,
    },
    Softmax {
        dim: usize,
    },
}

/// A serializable description of a network architecture.
///
/// Parameters are not stored: `build` draws fresh ones, reproducibly when
/// `seed` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Human-readable name used in logs.
    pub name: String,
    /// Shape of a single example, without the batch dimension.
    pub input_shape: Vec<usize>,
    /// Ordered list of stages (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ModelSpec {
    /// 28×28 images → flatten → 784→20 → ReLU → 20→10 logits.
    pub fn quickstart() -> ModelSpec {
        ModelSpec {
            name: "quickstart".to_string(),
            input_shape: vec![28, 28],
            layers: vec![
                LayerSpec::Flatten { start_dim: 1 },
                LayerSpec::Linear { in_features: 784, out_features: 20 },
                LayerSpec::Activation { function: ActivationFunction::ReLU },
                LayerSpec::Linear { in_features: 20, out_features: 10 },
            ],
            seed: None,
        }
    }

    /// Instantiates the pipeline on `device` and checks that a batch of
    /// `input_shape` examples flows through every stage.
    pub fn build(&self, device: Device) -> Result<Sequential> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let stages = self
            .layers
            .iter()
            .map(|layer| -> Result<Stage> {
                Ok(match layer {
                    LayerSpec::Flatten { start_dim } => Flatten::new(*start_dim).into(),
                    LayerSpec::Linear { in_features, out_features } => {
                        Linear::new(*in_features, *out_features, &mut rng)?.to(device).into()
                    }
                    LayerSpec::Activation { function } => (*function).into(),
                    LayerSpec::Softmax { dim } => Stage::Softmax { dim: *dim },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let model = Sequential::new(stages)?;
        let mut batch_shape = vec![1];
        batch_shape.extend_from_slice(&self.input_shape);
        checked_numel(&batch_shape)?;
        let output_shape = model.output_shape(&batch_shape)?;

        info!(
            name = %self.name,
            %device,
            stages = model.len(),
            parameters = model.parameter_count(),
            output = ?&output_shape[1..],
            "built model"
        );
        Ok(model)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `ModelSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> std::io::Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
