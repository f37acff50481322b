use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install a global `tracing` subscriber described by `config`
///
/// `RUST_LOG` wins over the configured level when set. Only the first call in
/// a process has any effect, and `log_to_console = false` leaves the process
/// without a subscriber so an embedding application can install its own.
///
/// # Example
/// ```
/// use drone_comms::config::LoggingConfig;
/// use drone_comms::utils::logging::init_logging;
/// use tracing::Level;
///
/// let config = LoggingConfig {
///     log_level: Level::DEBUG,
///     ..Default::default()
/// };
///
/// init_logging(&config);
/// ```
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        if !config.log_to_console {
            return;
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "warn,{app_name}={level}",
                app_name = config.app_name,
                level = config.log_level
            ))
        });

        let registry = registry().with(filter);
        // try_init: a host application may already own the global dispatcher
        let installed = if config.json_format {
            registry
                .with(fmt::layer().json().with_writer(std::io::stdout))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
                .try_init()
        };

        if installed.is_ok() {
            tracing::info!("Logging initialized at {} level", config.log_level);
        }
    });
}

/// Console logging with default settings
pub fn setup_default_logging() {
    init_logging(&LoggingConfig::default());
}
