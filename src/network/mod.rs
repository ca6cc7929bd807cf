pub mod predict;
pub mod sequential;
pub mod spec;

pub use predict::{predict, Prediction};
pub use sequential::Sequential;
pub use spec::{LayerSpec, ModelSpec};
