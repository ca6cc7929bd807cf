pub mod error;
pub mod device;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;

// Convenience re-exports
pub use error::{NnError, Result};
pub use device::{select_device, BackendAvailability, Device};
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::{flatten::Flatten, linear::Linear, stage::Stage};
pub use network::{predict, LayerSpec, ModelSpec, Prediction, Sequential};
