// Re-export main components for easy access
pub use aggregate::{summarize, MetricStats, SessionStats, TelemetrySummary};
pub use error::{ProviderError, SamplerError};
pub use provider::{NvmlProvider, TelemetryProvider};
pub use sample::{Sample, SamplingSession, TelemetryReading};
pub use sampler::SamplerHandle;

pub mod aggregate;
pub mod error;
pub mod provider;
pub mod sample;
pub mod sampler;

/// Version of the gpuwatch-hardware library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
