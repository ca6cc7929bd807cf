use std::fmt;
use std::str::FromStr;

use crate::error::NnError;

/// Compute backend a tensor is placed on.
///
/// Arithmetic always runs on the host; the device is an affinity tag that
/// operations check for consistency, so a model and its input must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    Cuda,
    Mps,
    Xpu,
    #[default]
    Cpu,
}

impl Device {
    /// Accelerators in the order they are preferred.
    pub const PREFERENCE: [Device; 3] = [Device::Cuda, Device::Mps, Device::Xpu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Mps => "mps",
            Device::Xpu => "xpu",
            Device::Cpu => "cpu",
        }
    }

    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" => Ok(Device::Cuda),
            "mps" => Ok(Device::Mps),
            "xpu" => Ok(Device::Xpu),
            "cpu" => Ok(Device::Cpu),
            _ => Err(NnError::UnknownDevice(s.to_string())),
        }
    }
}
