//! Gate configuration.
//!
//! Everything the gate needs is loaded from one TOML file whose sections
//! all fall back to defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the capture source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Stream address handed to the capture source (`rtsp://`, `device://N`, `stub://`).
    pub uri: String,
    /// Upper bound on a single blocking frame read, in milliseconds.
    pub read_timeout_ms: u64,
    /// How long opening waits for the camera to start streaming, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            uri: "stub://camera".to_string(),
            read_timeout_ms: 500,
            connect_timeout_ms: 5000,
        }
    }
}

impl CameraConfig {
    /// Creates a configuration for the given stream address.
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Returns the read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Returns the connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::EmptyUri);
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidReadTimeout);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidConnectTimeout);
        }
        Ok(())
    }
}

/// Timing and failure policy of an authorization session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame pump period in milliseconds.
    pub pump_interval_ms: u64,
    /// Grace period between authorization and hand-off, in milliseconds.
    pub handoff_delay_ms: u64,
    /// Consecutive read failures tolerated before the stream is given up (0 = never).
    pub max_consecutive_read_failures: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pump_interval_ms: 30,
            handoff_delay_ms: 2000,
            max_consecutive_read_failures: 50,
        }
    }
}

impl SessionConfig {
    /// Returns the pump period as a [`Duration`].
    ///
    /// A zero period is never returned; it is raised to one millisecond.
    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms.max(1))
    }

    /// Returns the hand-off delay as a [`Duration`].
    pub fn handoff_delay(&self) -> Duration {
        Duration::from_millis(self.handoff_delay_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pump_interval_ms == 0 {
            return Err(ConfigError::InvalidPumpInterval);
        }
        if self.handoff_delay_ms == 0 {
            return Err(ConfigError::InvalidHandoffDelay);
        }
        Ok(())
    }
}

/// Frame-rate estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FpsConfig {
    /// Number of recent frames the rolling estimate spans.
    pub window: usize,
}

impl Default for FpsConfig {
    fn default() -> Self {
        Self { window: 30 }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The camera address is blank.
    #[error("camera uri must not be empty")]
    EmptyUri,
    /// `read_timeout_ms` is zero.
    #[error("read timeout must be greater than zero")]
    InvalidReadTimeout,
    /// `connect_timeout_ms` is zero.
    #[error("connect timeout must be greater than zero")]
    InvalidConnectTimeout,
    /// `pump_interval_ms` is zero.
    #[error("pump interval must be greater than zero")]
    InvalidPumpInterval,
    /// `handoff_delay_ms` is zero.
    #[error("hand-off delay must be greater than zero")]
    InvalidHandoffDelay,
    /// `fps.window` is below two.
    #[error("fps window must hold at least two frames")]
    InvalidFpsWindow,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this layout.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[camera]` section.
    #[serde(default)]
    pub camera: CameraConfig,
    /// `[session]` section.
    #[serde(default)]
    pub session: SessionConfig,
    /// `[fps]` section.
    #[serde(default)]
    pub fps: FpsConfig,
    /// `[metrics]` section.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.session.validate()?;
        if self.fps.window < 2 {
            return Err(ConfigError::InvalidFpsWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.pump_interval(), Duration::from_millis(30));
        assert_eq!(config.session.handoff_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.camera.uri, "stub://camera");
        assert_eq!(config.session.max_consecutive_read_failures, 50);
        assert_eq!(config.metrics.port, 0);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [camera]
            uri = "rtsp://10.0.0.5:554/stream2"

            [session]
            handoff_delay_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.uri, "rtsp://10.0.0.5:554/stream2");
        assert_eq!(config.camera.read_timeout_ms, 500);
        assert_eq!(config.camera.connect_timeout_ms, 5000);
        assert_eq!(config.session.handoff_delay_ms, 500);
        assert_eq!(config.session.pump_interval_ms, 30);
    }

    #[test]
    fn test_zero_pump_interval_invalid() {
        let result = FileConfig::from_toml("[session]\npump_interval_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidPumpInterval)));
    }

    #[test]
    fn test_zero_pump_interval_never_yields_zero_period() {
        let config = SessionConfig {
            pump_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.pump_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_zero_connect_timeout_invalid() {
        let result = FileConfig::from_toml("[camera]\nconnect_timeout_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidConnectTimeout)));
    }

    #[test]
    fn test_blank_uri_invalid() {
        let config = CameraConfig::with_uri("   ");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyUri)));
    }

    #[test]
    fn test_malformed_toml_reports_parse_error() {
        let result = FileConfig::from_toml("[session\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
