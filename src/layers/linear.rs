use rand::Rng;
use std::fmt;

use crate::device::Device;
use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

/// Fully-connected layer: `y = x · Wᵀ + b`.
///
/// Feature counts are read off the weight, so shape inference and the
/// forward pass always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    weight: Tensor, // [out_features, in_features]
    bias: Tensor,   // [out_features]
}

impl Linear {
    /// Weights and biases are drawn from U(-1/sqrt(in), 1/sqrt(in)).
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Result<Linear> {
        if in_features == 0 || out_features == 0 {
            return Err(NnError::InvalidLayer(format!(
                "linear layer needs non-zero features, got {in_features} -> {out_features}"
            )));
        }
        let fits = in_features
            .checked_mul(out_features)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(NnError::InvalidLayer(format!(
                "linear layer {in_features} -> {out_features} is too large to allocate"
            )));
        }
        let bound = 1.0 / (in_features as f64).sqrt();
        let weight = Tensor::uniform_with(&[out_features, in_features], -bound, bound, rng);
        let bias = Tensor::uniform_with(&[out_features], -bound, bound, rng);

        Ok(Linear { weight, bias })
    }

    /// Builds a layer from explicit parameters, checking their shapes agree.
    pub fn from_parameters(weight: Tensor, bias: Tensor) -> Result<Linear> {
        if weight.ndim() != 2 || weight.shape().contains(&0) {
            return Err(NnError::InvalidLayer(format!(
                "linear weight must be a non-empty [out, in] matrix, got {:?}",
                weight.shape()
            )));
        }
        let out_features = weight.shape()[0];
        if bias.shape() != [out_features] {
            return Err(NnError::ShapeMismatch {
                op: "linear bias".to_string(),
                expected: vec![out_features],
                got: bias.shape().to_vec(),
            });
        }
        bias.ensure_same_device(&weight)?;
        Ok(Linear { weight, bias })
    }

    pub fn in_features(&self) -> usize {
        self.weight.shape()[1]
    }

    pub fn out_features(&self) -> usize {
        self.weight.shape()[0]
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        input.linear(&self.weight, Some(&self.bias))
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        match input_shape.split_last() {
            Some((&last, lead)) if last == self.in_features() => {
                let mut out = lead.to_vec();
                out.push(self.out_features());
                Ok(out)
            }
            _ => {
                let mut expected = input_shape.to_vec();
                match expected.last_mut() {
                    Some(last) => *last = self.in_features(),
                    None => expected.push(self.in_features()),
                }
                Err(NnError::ShapeMismatch {
                    op: "linear".to_string(),
                    expected,
                    got: input_shape.to_vec(),
                })
            }
        }
    }

    pub fn to(&self, device: Device) -> Linear {
        Linear {
            weight: self.weight.to(device),
            bias: self.bias.to(device),
        }
    }

    pub fn device(&self) -> Device {
        self.weight.device()
    }
}

impl fmt::Display for Linear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Linear(in_features={}, out_features={}, bias=True)",
            self.in_features(),
            self.out_features()
        )
    }
}
