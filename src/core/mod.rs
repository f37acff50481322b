//! # Core Protocol Components
//!
//! Field encoding, packet framing and stream codecs.
//!
//! ## Components
//! - **Field**: Big-endian primitive fields plus bounded string/image decoding
//! - **Packet**: One in-flight packet with framing state, checksum and resync
//! - **Codec**: Tokio codecs driving packets over arbitrary byte streams
//!
//! ## Wire Format
//! ```text
//! [0xDA 0xA7] [Size(4)] [PID(1)] [Payload(Size-9)] [SumA(1)] [SumB(1)]
//! ```
//!
//! ## Robustness
//! - Advertised sizes are checked against a configurable maximum before buffering
//! - Misaligned or corrupt input is discarded up to the next sync marker
//! - Variable-length fields never read past their byte budget

pub mod codec;
pub mod field;
pub mod packet;
