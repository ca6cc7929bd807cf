use std::fmt;

use crate::error::Result;
use crate::math::tensor::{flattened_shape, Tensor};

/// Collapses every dimension from `start_dim` onward into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flatten {
    pub start_dim: usize,
}

impl Flatten {
    pub fn new(start_dim: usize) -> Flatten {
        Flatten { start_dim }
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        input.flatten(self.start_dim)
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        flattened_shape(input_shape, self.start_dim)
    }
}

/// Keeps the batch dimension, like a module-level flatten.
impl Default for Flatten {
    fn default() -> Self {
        Flatten { start_dim: 1 }
    }
}

impl fmt::Display for Flatten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flatten(start_dim={}, end_dim=-1)", self.start_dim)
    }
}
