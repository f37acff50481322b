//! # DroneComms
//!
//! Framed, checksummed point-to-point protocol between a ground-control station
//! and drone-side clients.
//!
//! Telemetry, imagery and flight commands travel over an unreliable byte stream
//! as packets of the form
//!
//! ```text
//! [0xDA 0xA7] [Size(4)] [PID(1)] [Payload(Size-9)] [SumA(1)] [SumB(1)]
//! ```
//!
//! with every multi-byte field big-endian. A receiver may see packets split or
//! glued together arbitrarily, and may see garbage between them; the framing
//! layer reassembles, validates and resynchronises on its own.
//!
//! ## Layout
//! - [`core`]: field codec, [`Packet`](core::packet::Packet) state machine, stream codecs
//! - [`protocol`]: message catalog, PID dispatch, waypoint geometry, frames
//! - [`config`]: wire constants and TOML/env configuration
//! - [`error`]: [`ProtocolError`](error::ProtocolError)
//! - [`utils`]: JPEG compression, logging setup, link metrics
//!
//! ## Example
//! ```rust
//! use bytes::BytesMut;
//! use drone_comms::core::codec::MessageCodec;
//! use drone_comms::protocol::command::EmergencyCommand;
//! use drone_comms::protocol::message::Message;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut codec = MessageCodec::new();
//! let mut wire = BytesMut::new();
//! codec.encode(Message::from(EmergencyCommand { action: 1 }), &mut wire).unwrap();
//!
//! // line noise in front of the packet is skipped
//! let mut noisy = BytesMut::from(&[0x00, 0x13, 0x37][..]);
//! noisy.extend_from_slice(&wire);
//! let decoded = codec.decode(&mut noisy).unwrap();
//! assert_eq!(decoded, Some(Message::from(EmergencyCommand { action: 1 })));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::codec::{MessageCodec, PacketCodec};
pub use crate::core::packet::Packet;
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::message::{Message, MessageKind, WireMessage};
