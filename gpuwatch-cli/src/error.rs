use gpuwatch_hardware::SamplerError;
use thiserror::Error;

/// Monitored-run error types
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("failed waiting for the monitored command: {0}")]
    Wait(#[from] std::io::Error),

    #[error("device telemetry failed: {0}")]
    Device(#[from] SamplerError),
}
