//! Integration tests for configuration loading and validation

#![allow(clippy::expect_used)]

use drone_comms::config::{DroneCommsConfig, LinkConfig, LoggingConfig, JPEG_QUALITY, MAX_PACKET_SIZE};
use drone_comms::error::ProtocolError;
use drone_comms::protocol::frame::PixelOrder;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = DroneCommsConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.link.max_packet_size, MAX_PACKET_SIZE);
    assert_eq!(config.link.jpeg_quality, JPEG_QUALITY);
    assert_eq!(config.link.pixel_order, PixelOrder::Rgb);
}

#[test]
fn test_max_packet_size_below_frame_overhead() {
    let mut config = DroneCommsConfig::default();
    config.link.max_packet_size = 8;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Max packet size too small")));
}

#[test]
fn test_max_packet_size_beyond_size_field() {
    let config = DroneCommsConfig::default_with_overrides(|c| {
        c.link.max_packet_size = u32::MAX as usize + 1;
    });

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("32-bit size field")));
}

#[test]
fn test_jpeg_quality_range() {
    for quality in [0u8, 101, 255] {
        let link = LinkConfig {
            jpeg_quality: quality,
            ..LinkConfig::default()
        };
        assert!(
            link.validate().iter().any(|e| e.contains("Invalid JPEG quality")),
            "quality {quality} accepted"
        );
    }
    for quality in [1u8, 50, 100] {
        let link = LinkConfig {
            jpeg_quality: quality,
            ..LinkConfig::default()
        };
        assert!(link.validate().is_empty());
    }
}

#[test]
fn test_empty_app_name() {
    let mut config = DroneCommsConfig::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_long_app_name() {
    let logging = LoggingConfig {
        app_name: "x".repeat(65),
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("too long")));
}

#[test]
fn test_json_without_console() {
    let logging = LoggingConfig {
        log_to_console: false,
        json_format: true,
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("json_format")));

    let silent = LoggingConfig {
        log_to_console: false,
        ..LoggingConfig::default()
    };
    assert!(silent.validate().is_empty());
}

#[test]
fn test_validate_strict_lists_every_problem() {
    let config = DroneCommsConfig::default_with_overrides(|c| {
        c.link.max_packet_size = 0;
        c.link.jpeg_quality = 0;
        c.logging.app_name = String::new();
    });
    assert_eq!(config.validate().len(), 3);

    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("Max packet size"));
            assert!(msg.contains("JPEG quality"));
            assert!(msg.contains("Application name"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
    assert!(DroneCommsConfig::default().validate_strict().is_ok());
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = DroneCommsConfig::from_toml(
        r#"
        [link]
        max_packet_size = 65536
        jpeg_quality = 80
        pixel_order = "bgr"
        "#,
    )
    .expect("valid TOML");

    assert_eq!(config.link.max_packet_size, 65536);
    assert_eq!(config.link.jpeg_quality, 80);
    assert_eq!(config.link.pixel_order, PixelOrder::Bgr);
    assert_eq!(config.logging.app_name, "drone_comms");
    assert_eq!(config.logging.log_level, Level::INFO);
}

#[test]
fn test_log_level_parsing() {
    let config = DroneCommsConfig::from_toml(
        r#"
        [logging]
        app_name = "ground_station"
        log_level = "debug"
        log_to_console = true
        json_format = true
        "#,
    )
    .expect("valid TOML");
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);

    let bad = DroneCommsConfig::from_toml(
        r#"
        [logging]
        app_name = "ground_station"
        log_level = "loud"
        log_to_console = true
        json_format = false
        "#,
    );
    assert!(matches!(bad, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_malformed_toml_rejected() {
    let result = DroneCommsConfig::from_toml("[link\nmax_packet_size = ");
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_example_config_parses_back() {
    let text = DroneCommsConfig::example_config();
    assert!(text.contains("[link]"));
    assert!(text.contains("[logging]"));
    let parsed = DroneCommsConfig::from_toml(&text).expect("example config parses");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_save_and_load_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("drone_comms.toml");

    let config = DroneCommsConfig::default_with_overrides(|c| {
        c.link.jpeg_quality = 70;
        c.logging.log_level = Level::WARN;
    });
    config.save_to_file(&path).expect("save");

    let loaded = DroneCommsConfig::from_file(&path).expect("load");
    assert_eq!(loaded.link.jpeg_quality, 70);
    assert_eq!(loaded.logging.log_level, Level::WARN);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = DroneCommsConfig::from_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

// Environment overrides share process state, so they are exercised in one test
#[test]
fn test_env_overrides() {
    std::env::set_var("DRONE_COMMS_MAX_PACKET_SIZE", "4096");
    std::env::set_var("DRONE_COMMS_JPEG_QUALITY", "60");
    std::env::set_var("DRONE_COMMS_LOG_LEVEL", "trace");
    let config = DroneCommsConfig::from_env().expect("env config");
    assert_eq!(config.link.max_packet_size, 4096);
    assert_eq!(config.link.jpeg_quality, 60);
    assert_eq!(config.logging.log_level, Level::TRACE);

    std::env::set_var("DRONE_COMMS_JPEG_QUALITY", "high");
    let result = DroneCommsConfig::from_env();
    assert!(matches!(result, Err(ProtocolError::ConfigError(ref m)) if m.contains("JPEG_QUALITY")));

    std::env::remove_var("DRONE_COMMS_MAX_PACKET_SIZE");
    std::env::remove_var("DRONE_COMMS_JPEG_QUALITY");
    std::env::remove_var("DRONE_COMMS_LOG_LEVEL");
}
