use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::Nvml;
use tracing::{debug, info, warn};

use crate::error::{classify_nvml_error, ProviderError};
use crate::sample::TelemetryReading;

/// Capability boundary around vendor-specific GPU queries.
///
/// One blocking point read per call, no side effects, bounded duration.
/// Tests substitute a scripted implementation for this trait.
pub trait TelemetryProvider: Send + Sync {
    fn query(&self, device_index: u32) -> Result<TelemetryReading, ProviderError>;
}

/// NVML-backed telemetry provider
pub struct NvmlProvider {
    nvml: Nvml,
}

impl NvmlProvider {
    /// Initialize NVML. Fails when the driver or library is absent.
    pub fn new() -> Result<Self, ProviderError> {
        info!("Initializing NVML for GPU telemetry");

        let nvml = Nvml::init().map_err(|e| {
            warn!("Failed to initialize NVML: {}", e);
            ProviderError::Fatal(format!("NVML initialization failed: {}", e))
        })?;

        match nvml.device_count() {
            Ok(count) => info!("NVML found {} GPU(s)", count),
            Err(e) => warn!("Failed to count devices: {}", e),
        }

        Ok(Self { nvml })
    }

    pub fn device_count(&self) -> Result<u32, ProviderError> {
        self.nvml
            .device_count()
            .map_err(|e| ProviderError::Fatal(format!("failed to count devices: {}", e)))
    }

    /// Device name for the report header, e.g. "NVIDIA GeForce RTX 3080".
    pub fn device_name(&self, device_index: u32) -> Result<String, ProviderError> {
        let device = self
            .nvml
            .device_by_index(device_index)
            .map_err(|e| classify_nvml_error(device_index, e))?;
        device
            .name()
            .map_err(|e| classify_nvml_error(device_index, e))
    }
}

impl TelemetryProvider for NvmlProvider {
    fn query(&self, device_index: u32) -> Result<TelemetryReading, ProviderError> {
        let device = self
            .nvml
            .device_by_index(device_index)
            .map_err(|e| classify_nvml_error(device_index, e))?;

        // Memory
        let mem_info = device
            .memory_info()
            .map_err(|e| classify_nvml_error(device_index, e))?;

        // Temperature
        let temperature_c = device
            .temperature(TemperatureSensor::Gpu)
            .map_err(|e| classify_nvml_error(device_index, e))?;

        // Power, reported by NVML in milliwatts
        let power_w = device
            .power_usage()
            .map(|mw| f64::from(mw) / 1000.0)
            .map_err(|e| classify_nvml_error(device_index, e))?;

        // Clocks
        let sm_clock_mhz = device
            .clock_info(Clock::SM)
            .map_err(|e| classify_nvml_error(device_index, e))?;
        let memory_clock_mhz = device
            .clock_info(Clock::Memory)
            .map_err(|e| classify_nvml_error(device_index, e))?;

        debug!(
            "GPU {}: {} MiB used, {}C, {:.1}W, {} MHz SM",
            device_index,
            mem_info.used / (1024 * 1024),
            temperature_c,
            power_w,
            sm_clock_mhz
        );

        Ok(TelemetryReading {
            memory_used_bytes: mem_info.used,
            memory_total_bytes: mem_info.total,
            temperature_c,
            power_w,
            sm_clock_mhz,
            memory_clock_mhz,
        })
    }
}
