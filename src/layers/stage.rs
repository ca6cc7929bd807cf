use std::fmt;

use crate::activation::activation::ActivationFunction;
use crate::device::Device;
use crate::error::{NnError, Result};
use crate::layers::{flatten::Flatten, linear::Linear};
use crate::math::tensor::Tensor;

/// One transform step of a `Sequential` pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Flatten(Flatten),
    Linear(Linear),
    Activation(ActivationFunction),
    /// Normalizes along `dim`; parameter-free.
    Softmax { dim: usize },
}

impl Stage {
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        match self {
            Stage::Flatten(flatten) => flatten.forward(input),
            Stage::Linear(linear) => linear.forward(input),
            Stage::Activation(activation) => Ok(activation.apply(input)),
            Stage::Softmax { dim } => input.softmax(*dim),
        }
    }

    /// Shape this stage produces for `input_shape`, failing exactly where
    /// `forward` would.
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        match self {
            Stage::Flatten(flatten) => flatten.output_shape(input_shape),
            Stage::Linear(linear) => linear.output_shape(input_shape),
            Stage::Activation(_) => Ok(input_shape.to_vec()),
            Stage::Softmax { dim } => {
                if *dim >= input_shape.len() {
                    return Err(NnError::DimOutOfRange { dim: *dim, ndim: input_shape.len() });
                }
                Ok(input_shape.to_vec())
            }
        }
    }

    /// `(name, tensor)` pairs for the learnable parameters of this stage.
    pub fn named_parameters(&self) -> Vec<(&'static str, &Tensor)> {
        match self {
            Stage::Linear(linear) => vec![("weight", linear.weight()), ("bias", linear.bias())],
            _ => Vec::new(),
        }
    }

    pub fn to(&self, device: Device) -> Stage {
        match self {
            Stage::Linear(linear) => Stage::Linear(linear.to(device)),
            other => other.clone(),
        }
    }
}

impl From<Flatten> for Stage {
    fn from(flatten: Flatten) -> Self {
        Stage::Flatten(flatten)
    }
}

impl From<Linear> for Stage {
    fn from(linear: Linear) -> Self {
        Stage::Linear(linear)
    }
}

impl From<ActivationFunction> for Stage {
    fn from(activation: ActivationFunction) -> Self {
        Stage::Activation(activation)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Flatten(flatten) => write!(f, "{flatten}"),
            Stage::Linear(linear) => write!(f, "{linear}"),
            Stage::Activation(activation) => write!(f, "{activation}"),
            Stage::Softmax { dim } => write!(f, "Softmax(dim={dim})"),
        }
    }
}
