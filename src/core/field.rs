//! # Field Codec
//!
//! Big-endian encoding of the primitive and compound fields that make up
//! DroneComms payloads.
//!
//! Primitive fields are written through [`bytes::BufMut`] (`put_u16`, `put_f32`,
//! ...), which is most-significant-byte first and converts floating point values
//! with explicit `to_bits`. [`PutFields`] adds the compound fields:
//! length-prefixed strings, raw RGB images and JPEG-compressed images.
//!
//! [`FieldReader`] is the matching decoder. Fixed-width reads fail with
//! `ProtocolError::Truncated` instead of running off the end of the buffer.
//! Variable-length reads use *bounded decode*: the caller passes the number of
//! bytes the field may occupy, and a field whose declared size would exceed that
//! budget consumes the whole budget, yields an empty value and marks the reader
//! as overrun.
//!
//! ## Wire Layouts
//! ```text
//! string: [len:u32][bytes:len]
//! image:  [rows:u16][cols:u16][R G B]*(rows*cols)
//! jpeg:   [bytes...] (no prefix, fills the rest of the payload)
//! ```

use bytes::{Buf, BufMut};
use tracing::warn;

use crate::error::{ProtocolError, Result};
use crate::protocol::frame::{Frame, PixelOrder};
use crate::utils::compression::{compress_frame, decompress_frame};

/// Size of the length prefix in front of a string field
pub const STRING_PREFIX_SIZE: usize = 4;

/// Size of the row/column prefix in front of an image field
pub const IMAGE_PREFIX_SIZE: usize = 4;

/// Compound field encoders for any [`BufMut`]
pub trait PutFields: BufMut {
    /// 4-byte length prefix followed by the raw bytes
    ///
    /// # Errors
    /// Returns `ProtocolError::OversizedPacket` if the string is longer than a
    /// 32-bit length prefix can describe.
    fn put_string_field(&mut self, value: &[u8]) -> Result<()> {
        let len =
            u32::try_from(value.len()).map_err(|_| ProtocolError::OversizedPacket(value.len()))?;
        self.put_u32(len);
        self.put_slice(value);
        Ok(())
    }

    /// Row count, column count, then row-major pixels as R, G, B
    fn put_image_field(&mut self, frame: &Frame) {
        self.put_u16(frame.rows());
        self.put_u16(frame.cols());
        for row in 0..usize::from(frame.rows()) {
            for col in 0..usize::from(frame.cols()) {
                self.put_slice(&frame.pixel(row, col));
            }
        }
    }

    /// JPEG stream with no length prefix
    ///
    /// # Errors
    /// Returns `ProtocolError::CompressionFailure` if the frame cannot be encoded.
    fn put_compressed_image_field(&mut self, frame: &Frame, quality: u8) -> Result<()> {
        let jpeg = compress_frame(frame, quality)?;
        self.put_slice(&jpeg);
        Ok(())
    }
}

impl<B: BufMut + ?Sized> PutFields for B {}

/// Cursor over a payload that decodes fields in wire order
#[derive(Debug)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    overrun: bool,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            overrun: false,
        }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Whether any bounded field was abandoned for exceeding its budget
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(ProtocolError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Abandon a bounded field: skip what is left of its budget and zero it
    fn abandon(&mut self, field: &'static str, budget: &mut usize) {
        warn!(field, budget = *budget, "Field exceeds remaining packet bytes, aborting decode");
        let skip = (*budget).min(self.buf.len());
        self.buf = &self.buf[skip..];
        *budget = 0;
        self.overrun = true;
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    /// Length-prefixed string, bounded by `budget` (prefix included)
    ///
    /// On success `budget` is decremented by the bytes consumed. If the prefix
    /// itself does not fit, or the declared length would exceed the budget, the
    /// whole budget is consumed and an empty vector is returned.
    pub fn string(&mut self, budget: &mut usize) -> Vec<u8> {
        if *budget < STRING_PREFIX_SIZE || self.buf.len() < STRING_PREFIX_SIZE {
            self.abandon("string", budget);
            return Vec::new();
        }

        let len = self.buf.get_u32() as usize;
        *budget -= STRING_PREFIX_SIZE;
        if len > *budget || len > self.buf.len() {
            self.abandon("string", budget);
            return Vec::new();
        }

        let (bytes, tail) = self.buf.split_at(len);
        self.buf = tail;
        *budget -= len;
        bytes.to_vec()
    }

    /// Raw RGB image, bounded by `budget` (row/column prefix included)
    ///
    /// Pixels are stored into a frame laid out in `order`. Follows the same
    /// abandon-on-overrun rule as [`FieldReader::string`], returning an empty frame.
    pub fn image(&mut self, budget: &mut usize, order: PixelOrder) -> Frame {
        if *budget < IMAGE_PREFIX_SIZE || self.buf.len() < IMAGE_PREFIX_SIZE {
            self.abandon("image", budget);
            return Frame::new(0, 0, order);
        }

        let rows = self.buf.get_u16();
        let cols = self.buf.get_u16();
        *budget -= IMAGE_PREFIX_SIZE;
        let pixel_bytes = usize::from(rows) * usize::from(cols) * 3;
        if pixel_bytes > *budget || pixel_bytes > self.buf.len() {
            self.abandon("image", budget);
            return Frame::new(0, 0, order);
        }

        let mut frame = Frame::new(rows, cols, order);
        for row in 0..usize::from(rows) {
            for col in 0..usize::from(cols) {
                let r = self.buf.get_u8();
                let g = self.buf.get_u8();
                let b = self.buf.get_u8();
                frame.set_pixel(row, col, [r, g, b]);
            }
        }
        *budget -= pixel_bytes;
        frame
    }

    /// JPEG stream occupying exactly the next `len` bytes
    ///
    /// # Errors
    /// Returns `ProtocolError::Truncated` if fewer than `len` bytes remain, or a
    /// decompression error if the stream does not decode.
    pub fn compressed_image(&mut self, len: usize, order: PixelOrder) -> Result<Frame> {
        let jpeg = self.take(len)?;
        decompress_frame(jpeg, order)
    }
}
