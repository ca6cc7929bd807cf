pub mod flatten;
pub mod linear;
pub mod stage;

pub use flatten::Flatten;
pub use linear::Linear;
pub use stage::Stage;
