pub mod device;
pub mod selector;

pub use device::Device;
pub use selector::{select_device, BackendAvailability};
