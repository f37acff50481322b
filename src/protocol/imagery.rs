//! Live imagery: raw frames (PID 2) and JPEG-compressed frames (PID 5).
//!
//! Raw frames are lossless and large (3 bytes per pixel). Compressed frames
//! carry a JPEG stream that fills the rest of the payload, so their packet size
//! is only known after encoding; [`Packet::assemble`](crate::core::packet::Packet::assemble)
//! computes it from the finished payload. Decoding produces frames in the
//! channel order configured on the link.

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::config::LinkConfig;
use crate::core::field::{FieldReader, PutFields};
use crate::core::packet::Packet;
use crate::error::Result;
use crate::protocol::frame::{Frame, PixelOrder};
use crate::protocol::message::{MessageKind, WireMessage};

/// Uncompressed video frame (PID 2)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    /// Frame rate the sender is aiming for (frame/s)
    pub target_fps: f32,
    pub frame: Frame,
}

impl WireMessage for Image {
    const KIND: MessageKind = MessageKind::Image;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.reserve(8 + self.frame.as_raw().len());
        buf.put_f32(self.target_fps);
        buf.put_image_field(&self.frame);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, link: &LinkConfig) -> Result<Self> {
        let target_fps = reader.f32()?;
        let mut budget = reader.remaining();
        let frame = reader.image(&mut budget, link.pixel_order);
        Ok(Self { target_fps, frame })
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TargetFPS : {} frame/s", self.target_fps)?;
        writeln!(f, "Frame ----: {} x {} Image", self.frame.rows(), self.frame.cols())
    }
}

/// JPEG-compressed video frame (PID 5)
///
/// Equality compares the in-memory frame exactly; after a round trip through
/// the wire compare with [`Frame::max_channel_delta`] instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompressedImage {
    pub target_fps: f32,
    pub frame: Frame,
}

impl CompressedImage {
    /// Serialize with an explicit JPEG quality (1-100)
    pub fn serialize_with_quality(&self, quality: u8) -> Result<Packet> {
        self.serialize_with(&LinkConfig {
            jpeg_quality: quality,
            ..LinkConfig::default()
        })
    }

    /// Deserialize into a frame laid out in `order`
    pub fn deserialize_with_order(packet: &Packet, order: PixelOrder) -> Result<Self> {
        Self::deserialize_with(
            packet,
            &LinkConfig {
                pixel_order: order,
                ..LinkConfig::default()
            },
        )
    }
}

impl WireMessage for CompressedImage {
    const KIND: MessageKind = MessageKind::CompressedImage;

    fn encode_payload(&self, buf: &mut BytesMut, link: &LinkConfig) -> Result<()> {
        buf.put_f32(self.target_fps);
        buf.put_compressed_image_field(&self.frame, link.jpeg_quality)
    }

    fn decode_payload(reader: &mut FieldReader<'_>, link: &LinkConfig) -> Result<Self> {
        let target_fps = reader.f32()?;
        let jpeg_len = reader.remaining();
        let frame = reader.compressed_image(jpeg_len, link.pixel_order)?;
        Ok(Self { target_fps, frame })
    }
}

impl fmt::Display for CompressedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TargetFPS : {} frame/s", self.target_fps)?;
        writeln!(
            f,
            "Frame ----: {} x {} Image (JPEG)",
            self.frame.rows(),
            self.frame.cols()
        )
    }
}
