//! # Configuration Management
//!
//! Protocol constants and runtime configuration for a drone link.
//!
//! The wire constants below are part of the DroneComms compatibility contract and
//! are never configurable. The runtime structures cover the knobs a ground
//! station or drone-side client may tune per deployment: packet size limits,
//! JPEG quality for compressed imagery, the channel order decoded frames are
//! handed back in, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`

use crate::error::{ProtocolError, Result};
use crate::protocol::frame::PixelOrder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Two-byte marker opening every packet (0xDAA7)
pub const SYNC_MARKER: [u8; 2] = [0xDA, 0xA7];

/// Sync marker + size field + PID
pub const HEADER_SIZE: usize = 7;

/// Two running-sum bytes trailing every packet
pub const CHECKSUM_SIZE: usize = 2;

/// Bytes every packet carries in addition to its payload
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Default upper bound on an advertised packet size (32 MiB, a 4K raw frame fits)
pub const MAX_PACKET_SIZE: usize = 32 * 1024 * 1024;

/// JPEG quality factor used for compressed imagery
pub const JPEG_QUALITY: u8 = 95;

/// Top-level configuration for a DroneComms endpoint
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DroneCommsConfig {
    /// Framing and imagery settings
    #[serde(default)]
    pub link: LinkConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DroneCommsConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("DRONE_COMMS_MAX_PACKET_SIZE") {
            config.link.max_packet_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid DRONE_COMMS_MAX_PACKET_SIZE: {e}"))
            })?;
        }

        if let Ok(quality) = std::env::var("DRONE_COMMS_JPEG_QUALITY") {
            config.link.jpeg_quality = quality.parse::<u8>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid DRONE_COMMS_JPEG_QUALITY: {e}"))
            })?;
        }

        if let Ok(level) = std::env::var("DRONE_COMMS_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid DRONE_COMMS_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.link.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Framing and imagery settings for one link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Largest advertised packet size accepted before resynchronising
    pub max_packet_size: usize,

    /// JPEG quality factor (1-100) for compressed imagery
    pub jpeg_quality: u8,

    /// Channel order decoded frames are produced in
    #[serde(default)]
    pub pixel_order: PixelOrder,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            jpeg_quality: JPEG_QUALITY,
            pixel_order: PixelOrder::default(),
        }
    }
}

impl LinkConfig {
    /// Validate link configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_packet_size < FRAME_OVERHEAD {
            errors.push(format!(
                "Max packet size too small: {} bytes (minimum: {FRAME_OVERHEAD})",
                self.max_packet_size
            ));
        } else if self.max_packet_size > u32::MAX as usize {
            errors.push(format!(
                "Max packet size {} exceeds the 32-bit size field",
                self.max_packet_size
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            errors.push(format!(
                "Invalid JPEG quality: {} (valid range: 1-100)",
                self.jpeg_quality
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name used as the default filter target
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console; false installs no subscriber at all
    pub log_to_console: bool,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("drone_comms"),
            log_level: Level::INFO,
            log_to_console: true,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if !self.log_to_console && self.json_format {
            errors.push("json_format has no effect when log_to_console is false".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
