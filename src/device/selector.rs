use std::env::VarError;
use tracing::{info, warn};

use crate::device::Device;

/// Environment variable listing the accelerators present on this machine,
/// e.g. `SEQNET_BACKENDS=cuda,mps`.
pub const BACKENDS_ENV: &str = "SEQNET_BACKENDS";

/// Which accelerator backends are available at runtime.
/// The CPU is always available and therefore has no flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendAvailability {
    pub cuda: bool,
    pub mps: bool,
    pub xpu: bool,
}

impl BackendAvailability {
    /// No accelerator available.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list of backend names. Names are matched
    /// case-insensitively; `cpu` and unknown names are skipped.
    pub fn from_list(list: &str) -> Self {
        let mut avail = Self::none();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.parse::<Device>() {
                Ok(Device::Cuda) => avail.cuda = true,
                Ok(Device::Mps) => avail.mps = true,
                Ok(Device::Xpu) => avail.xpu = true,
                Ok(Device::Cpu) => {}
                Err(_) => warn!(backend = name, "ignoring unknown backend name"),
            }
        }
        avail
    }

    /// Reads availability from `SEQNET_BACKENDS`; unset means none.
    pub fn from_env() -> Self {
        Self::from_var(std::env::var(BACKENDS_ENV))
    }

    fn from_var(var: Result<String, VarError>) -> Self {
        match var {
            Ok(list) => Self::from_list(&list),
            Err(VarError::NotPresent) => Self::none(),
            Err(VarError::NotUnicode(raw)) => {
                warn!(var = BACKENDS_ENV, value = ?raw, "ignoring backend list that is not valid UTF-8");
                Self::none()
            }
        }
    }

    pub fn is_available(&self, device: Device) -> bool {
        match device {
            Device::Cuda => self.cuda,
            Device::Mps => self.mps,
            Device::Xpu => self.xpu,
            Device::Cpu => true,
        }
    }
}

/// Returns the first available accelerator in preference order, or the CPU.
pub fn select_device(avail: &BackendAvailability) -> Device {
    let device = Device::PREFERENCE
        .into_iter()
        .find(|d| avail.is_available(*d))
        .unwrap_or(Device::Cpu);
    info!(%device, "selected device");
    device
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_cpu() {
        assert_eq!(select_device(&BackendAvailability::none()), Device::Cpu);
    }

    #[test]
    fn honours_preference_order() {
        let all = BackendAvailability { cuda: true, mps: true, xpu: true };
        assert_eq!(select_device(&all), Device::Cuda);

        let no_cuda = BackendAvailability { cuda: false, mps: true, xpu: true };
        assert_eq!(select_device(&no_cuda), Device::Mps);

        let xpu_only = BackendAvailability { xpu: true, ..Default::default() };
        assert_eq!(select_device(&xpu_only), Device::Xpu);
    }

    #[test]
    fn unreadable_env_value_means_none() {
        let raw = std::ffi::OsString::from("cuda");
        assert_eq!(BackendAvailability::from_var(Err(VarError::NotUnicode(raw))), BackendAvailability::none());
        assert_eq!(BackendAvailability::from_var(Err(VarError::NotPresent)), BackendAvailability::none());
        assert_eq!(
            BackendAvailability::from_var(Ok("xpu".to_string())),
            BackendAvailability { xpu: true, ..Default::default() }
        );
    }

    #[test]
    fn parses_backend_list() {
        let avail = BackendAvailability::from_list(" MPS, bogus ,,cpu");
        assert_eq!(avail, BackendAvailability { cuda: false, mps: true, xpu: false });
        assert_eq!(BackendAvailability::from_list(""), BackendAvailability::none());
    }
}
