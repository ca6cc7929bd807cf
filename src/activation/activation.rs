use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};
use std::fmt;

use crate::math::tensor::Tensor;

/// Element-wise nonlinearities usable as pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationFunction {
    #[serde(rename = "relu")]
    ReLU,
    Sigmoid,
    Tanh,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    Gelu,
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Identity => x,
        }
    }

    /// Applies the activation to every element; the shape is unchanged.
    pub fn apply(&self, input: &Tensor) -> Tensor {
        match self {
            ActivationFunction::ReLU => input.relu(),
            other => input.map(|x| other.function(x)),
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationFunction::ReLU => write!(f, "ReLU()"),
            ActivationFunction::Sigmoid => write!(f, "Sigmoid()"),
            ActivationFunction::Tanh => write!(f, "Tanh()"),
            ActivationFunction::LeakyReLU { alpha } => write!(f, "LeakyReLU(negative_slope={alpha})"),
            ActivationFunction::Gelu => write!(f, "GELU(approximate='tanh')"),
            ActivationFunction::Identity => write!(f, "Identity()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clamps_negatives() {
        let x = Tensor::from_vec(vec![-2.0, -0.0, 0.5, 3.0], &[2, 2]).unwrap();
        let y = ActivationFunction::ReLU.apply(&x);
        assert_eq!(y.shape(), &[2, 2]);
        assert_eq!(y.data(), &[0.0, 0.0, 0.5, 3.0]);
    }

    #[test]
    fn leaky_relu_scales_negatives() {
        let f = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert!((f.function(-2.0) + 0.2).abs() < 1e-12);
        assert_eq!(f.function(4.0), 4.0);
    }

    #[test]
    fn sigmoid_is_centered() {
        assert!((ActivationFunction::Sigmoid.function(0.0) - 0.5).abs() < 1e-12);
        assert!(ActivationFunction::Tanh.function(0.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&ActivationFunction::ReLU).unwrap();
        assert_eq!(json, r#"{"type":"relu"}"#);
        let back: ActivationFunction = serde_json::from_str(r#"{"type":"leaky_relu","alpha":0.01}"#).unwrap();
        assert_eq!(back, ActivationFunction::LeakyReLU { alpha: 0.01 });
    }
}
