//! # Utility Modules
//!
//! Supporting pieces shared by the framing and message layers.
//!
//! ## Components
//! - **Compression**: JPEG encode/decode of frames for compressed imagery
//! - **Logging**: `tracing` subscriber setup driven by [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Atomic link counters
//!
//! ## Limits
//! Decoded JPEG frames are capped at the maximum packet size to guard against
//! decompression bombs.

pub mod compression;
pub mod logging;
pub mod metrics;

pub use metrics::{LinkMetrics, LinkMetricsSnapshot};
