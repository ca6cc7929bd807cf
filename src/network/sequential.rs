use std::fmt;
use tracing::debug;

use crate::device::Device;
use crate::error::{NnError, Result};
use crate::layers::stage::Stage;
use crate::math::tensor::Tensor;

/// Ordered pipeline of stages evaluated front to back.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequential {
    stages: Vec<Stage>,
}

impl Sequential {
    /// Builds a pipeline, rejecting linear stages whose input feature count
    /// disagrees with the previous linear stage's output (activations and
    /// softmax pass the feature count through), and parameters spread over
    /// more than one device.
    pub fn new(stages: Vec<Stage>) -> Result<Sequential> {
        let mut features: Option<usize> = None;
        let mut device: Option<Device> = None;
        for (i, stage) in stages.iter().enumerate() {
            match stage {
                Stage::Linear(linear) => {
                    if let Some(f) = features {
                        if f != linear.in_features() {
                            return Err(NnError::ShapeMismatch {
                                op: format!("stage {i} ({linear})"),
                                expected: vec![linear.in_features()],
                                got: vec![f],
                            });
                        }
                    }
                    features = Some(linear.out_features());

                    match device {
                        Some(d) if d != linear.device() => {
                            return Err(NnError::DeviceMismatch { expected: d, got: linear.device() });
                        }
                        _ => device = Some(linear.device()),
                    }
                }
                Stage::Flatten(_) => features = None,
                Stage::Activation(_) | Stage::Softmax { .. } => {}
            }
        }
        Ok(Sequential { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Threads `input` through every stage in order.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let mut current = input.clone();
        for (index, stage) in self.stages.iter().enumerate() {
            current = stage.forward(&current)?;
            debug!(index, %stage, shape = ?current.shape(), "stage forward");
        }
        Ok(current)
    }

    /// Static shape inference; fails at the first stage `forward` would fail on.
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        self.stages
            .iter()
            .try_fold(input_shape.to_vec(), |shape, stage| stage.output_shape(&shape))
    }

    /// Parameters keyed as `<stage index>.<name>`, in stage order.
    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        self.stages
            .iter()
            .enumerate()
            .flat_map(|(i, stage)| {
                stage
                    .named_parameters()
                    .into_iter()
                    .map(move |(name, tensor)| (format!("{i}.{name}"), tensor))
            })
            .collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.named_parameters().iter().map(|(_, t)| t.numel()).sum()
    }

    /// Device holding the parameters; `None` for a parameter-free pipeline.
    pub fn device(&self) -> Option<Device> {
        self.named_parameters().first().map(|(_, t)| t.device())
    }

    pub fn to(&self, device: Device) -> Sequential {
        Sequential { stages: self.stages.iter().map(|s| s.to(device)).collect() }
    }
}

impl fmt::Display for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequential(")?;
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "  ({i}): {stage}")?;
        }
        write!(f, ")")
    }
}
