use nvml_wrapper::error::NvmlError;
use thiserror::Error;

/// A single telemetry query failure.
///
/// Transient failures are counted and skipped; fatal failures abort the
/// whole monitoring run.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("telemetry read failed: {0}")]
    Transient(String),

    #[error("device unusable: {0}")]
    Fatal(String),
}

impl ProviderError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Fatal(_))
    }
}

/// Sampling loop failure.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("sampling task failed: {0}")]
    Task(String),
}

/// Map an NVML error to the transient/fatal split.
///
/// Device-identity and driver errors cannot recover within a run. Everything
/// else (busy device, timeout, momentary no-data during reinitialization) is
/// treated as a skipped poll so a single odd reading never aborts a long run.
pub(crate) fn classify_nvml_error(device_index: u32, err: NvmlError) -> ProviderError {
    match err {
        NvmlError::Uninitialized
        | NvmlError::InvalidArg
        | NvmlError::NotFound
        | NvmlError::NoPermission
        | NvmlError::DriverNotLoaded
        | NvmlError::LibraryNotFound
        | NvmlError::FunctionNotFound
        | NvmlError::GpuLost
        | NvmlError::ResetRequired
        | NvmlError::NotSupported => {
            ProviderError::Fatal(format!("GPU {}: {}", device_index, err))
        }
        other => ProviderError::Transient(format!("GPU {}: {}", device_index, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_errors_are_fatal() {
        assert!(classify_nvml_error(0, NvmlError::NotFound).is_fatal());
        assert!(classify_nvml_error(0, NvmlError::DriverNotLoaded).is_fatal());
        assert!(classify_nvml_error(1, NvmlError::GpuLost).is_fatal());
    }

    #[test]
    fn test_momentary_errors_are_transient() {
        assert!(!classify_nvml_error(0, NvmlError::Timeout).is_fatal());
        assert!(!classify_nvml_error(0, NvmlError::Unknown).is_fatal());
        assert!(!classify_nvml_error(0, NvmlError::NoData).is_fatal());
    }

    #[test]
    fn test_error_message_names_device() {
        let err = classify_nvml_error(2, NvmlError::NotFound);
        assert!(err.to_string().contains("GPU 2"));
    }
}
