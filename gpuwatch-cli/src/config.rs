use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration. Every field has a default; CLI flags override
/// file values, file values override defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// GPU index to sample
    #[serde(default = "default_device")]
    pub device: u32,

    /// Sampling interval, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Delay before sampling starts, in seconds
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            interval_ms: default_interval_ms(),
            delay_secs: default_delay_secs(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load(path: &Path) -> Result<WatchConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

// Default value functions for serde
fn default_device() -> u32 {
    0
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_delay_secs() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let config: WatchConfig = toml::from_str(
            r#"
            device = 1
            interval_ms = 250
            delay_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.device, 1);
        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.delay_secs, 2);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: WatchConfig = toml::from_str("interval_ms = 500").unwrap();

        assert_eq!(config.device, 0);
        assert_eq!(config.interval_ms, 500);
        assert_eq!(config.delay_secs, 0);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = load(Path::new("/nonexistent/gpuwatch.toml")).unwrap_err();
        assert!(err.to_string().contains("gpuwatch.toml"));
    }

    #[test]
    fn test_load_reports_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "interval_ms = \"soon\"").unwrap();

        assert!(load(&path).is_err());
    }
}
