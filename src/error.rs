//! # Error Types
//!
//! Error handling for the drone link protocol.
//!
//! This module defines every error variant that can surface while framing,
//! validating, encoding or decoding DroneComms packets.
//!
//! ## Error Categories
//! - **I/O Errors**: failures bubbled up from the byte stream a codec is driving
//! - **Framing Errors**: corrupt packets, oversized headers, PID mismatches
//! - **Decode Errors**: length preconditions, bounded-field overruns, unknown PIDs
//! - **Imagery Errors**: JPEG compression/decompression, frames too large for the wire
//! - **Configuration Errors**: invalid TOML or environment overrides
//!
//! Corruption is never fatal for a link: a [`PacketCodec`](crate::core::codec::PacketCodec)
//! resynchronises on its own and only hands validated packets upward. The errors
//! below are what a caller sees when it asks for something the bytes cannot give.
//!
//! ## Example Usage
//! ```rust
//! use drone_comms::core::packet::Packet;
//! use drone_comms::error::ProtocolError;
//! use drone_comms::protocol::message::Message;
//!
//! let garbage = Packet::from_bytes(&[0xDA, 0xA7, 0, 0, 0, 9, 3, 0, 0]);
//! match Message::from_packet(&garbage) {
//!     Ok(msg) => println!("decoded {msg}"),
//!     Err(ProtocolError::CorruptPacket) => println!("dropped corrupt packet"),
//!     Err(e) => println!("other failure: {e}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants shared by log lines and error payloads.
pub mod constants {
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Packet failed size or checksum validation")]
    CorruptPacket,

    #[error("Packet type mismatch: expected PID {expected}, found {found}")]
    PidMismatch { expected: u8, found: u8 },

    #[error("Invalid length {len} bytes for PID {pid}")]
    InvalidLength { pid: u8, len: usize },

    #[error("Payload of {len} bytes is not a whole number of {stride}-byte records")]
    MisalignedPayload { len: usize, stride: usize },

    #[error("Field '{0}' overruns the packet boundary")]
    FieldOverrun(String),

    #[error("Truncated field: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Unknown packet identifier: {0}")]
    UnknownPid(u8),

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Frame of {rows}x{cols} pixels does not fit the wire format")]
    FrameTooLarge { rows: usize, cols: usize },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Compression failed: {0}")]
    CompressionFailure(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("Unexpected message type")]
    UnexpectedMessage,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
