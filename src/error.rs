use thiserror::Error;

use crate::device::Device;

/// Errors raised while building or evaluating a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NnError {
    /// An operation received a tensor whose shape it cannot consume.
    #[error("shape mismatch in {op}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("tensors live on different devices: {expected} vs {got}")]
    DeviceMismatch { expected: Device, got: Device },

    #[error("dimension {dim} out of range for a tensor with {ndim} dimensions")]
    DimOutOfRange { dim: usize, ndim: usize },

    /// Raw data length does not match the element count of the requested shape.
    #[error("data of length {len} cannot fill shape {shape:?}")]
    DataLength { len: usize, shape: Vec<usize> },

    /// The element count of a shape does not fit in `usize`.
    #[error("shape {shape:?} has more elements than fit in memory")]
    ShapeOverflow { shape: Vec<usize> },

    #[error("{op} expects a tensor of rank {expected}, got shape {got:?}")]
    RankMismatch {
        op: String,
        expected: usize,
        got: Vec<usize>,
    },

    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    #[error("unknown device '{0}'")]
    UnknownDevice(String),
}

pub type Result<T> = std::result::Result<T, NnError>;
