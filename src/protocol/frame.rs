//! # Frame
//!
//! 8-bit, 3-channel raster carried by the image messages.
//!
//! A frame remembers the channel order its bytes are stored in, but every
//! accessor speaks canonical `[R, G, B]`. Two frames holding the same colours
//! compare equal regardless of their memory layout, and the wire codec always
//! emits red, green, blue.

use crate::error::{ProtocolError, Result};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// In-memory channel order of a [`Frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelOrder {
    /// Red, green, blue
    #[default]
    Rgb,
    /// Blue, green, red (camera SDK and OpenCV style buffers)
    Bgr,
}

impl PixelOrder {
    #[inline]
    fn to_rgb(self, px: [u8; 3]) -> [u8; 3] {
        match self {
            PixelOrder::Rgb => px,
            PixelOrder::Bgr => [px[2], px[1], px[0]],
        }
    }

    #[inline]
    fn from_rgb(self, rgb: [u8; 3]) -> [u8; 3] {
        // the swap is its own inverse
        self.to_rgb(rgb)
    }
}

/// Row-major raster of 3-byte pixels
#[derive(Debug, Clone, Default)]
pub struct Frame {
    rows: u16,
    cols: u16,
    order: PixelOrder,
    data: Vec<u8>,
}

impl Frame {
    /// Black frame of the given size
    pub fn new(rows: u16, cols: u16, order: PixelOrder) -> Self {
        Self {
            rows,
            cols,
            order,
            data: vec![0; usize::from(rows) * usize::from(cols) * 3],
        }
    }

    /// Wrap an existing buffer laid out in `order`
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidFrame` if `data` is not exactly `rows * cols * 3` bytes.
    pub fn from_raw(rows: u16, cols: u16, order: PixelOrder, data: Vec<u8>) -> Result<Self> {
        let expected = usize::from(rows) * usize::from(cols) * 3;
        if data.len() != expected {
            return Err(ProtocolError::InvalidFrame(format!(
                "{rows}x{cols} frame needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            order,
            data,
        })
    }

    /// Convert from an `image` crate buffer, storing the pixels in `order`
    ///
    /// # Errors
    /// Returns `ProtocolError::FrameTooLarge` if either dimension exceeds the
    /// 16-bit row/column fields of the wire format.
    pub fn from_rgb_image(img: &RgbImage, order: PixelOrder) -> Result<Self> {
        let (width, height) = img.dimensions();
        let (Ok(cols), Ok(rows)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(ProtocolError::FrameTooLarge {
                rows: height as usize,
                cols: width as usize,
            });
        };

        let mut frame = Self::new(rows, cols, order);
        for (x, y, px) in img.enumerate_pixels() {
            frame.set_pixel(y as usize, x as usize, px.0);
        }
        Ok(frame)
    }

    /// Copy into an `image` crate buffer (always RGB)
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(u32::from(self.cols), u32::from(self.rows), |x, y| {
            Rgb(self.pixel(y as usize, x as usize))
        })
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn order(&self) -> PixelOrder {
        self.order
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Raw bytes in this frame's own channel order
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (`row`, `col`) as `[R, G, B]`
    ///
    /// # Panics
    /// Panics if the coordinates are outside the frame.
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let i = self.offset(row, col);
        self.order
            .to_rgb([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Store `[R, G, B]` at (`row`, `col`)
    ///
    /// # Panics
    /// Panics if the coordinates are outside the frame.
    pub fn set_pixel(&mut self, row: usize, col: usize, rgb: [u8; 3]) {
        let i = self.offset(row, col);
        self.data[i..i + 3].copy_from_slice(&self.order.from_rgb(rgb));
    }

    /// Same image, re-laid out in `order`
    pub fn with_order(&self, order: PixelOrder) -> Self {
        if order == self.order {
            return self.clone();
        }
        let mut out = Self::new(self.rows, self.cols, order);
        for row in 0..usize::from(self.rows) {
            for col in 0..usize::from(self.cols) {
                out.set_pixel(row, col, self.pixel(row, col));
            }
        }
        out
    }

    /// Largest per-channel difference between two frames of equal size
    ///
    /// Returns `None` when the dimensions differ. Used to judge lossy
    /// (JPEG) transport against a tolerance.
    pub fn max_channel_delta(&self, other: &Frame) -> Option<u8> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        let mut worst = 0u8;
        for row in 0..usize::from(self.rows) {
            for col in 0..usize::from(self.cols) {
                let a = self.pixel(row, col);
                let b = other.pixel(row, col);
                for c in 0..3 {
                    worst = worst.max(a[c].abs_diff(b[c]));
                }
            }
        }
        Some(worst)
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < usize::from(self.rows) && col < usize::from(self.cols),
            "pixel ({row}, {col}) outside {}x{} frame",
            self.rows,
            self.cols
        );
        (row * usize::from(self.cols) + col) * 3
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        if self.rows != other.rows || self.cols != other.cols {
            return false;
        }
        if self.order == other.order {
            return self.data == other.data;
        }
        (0..usize::from(self.rows)).all(|row| {
            (0..usize::from(self.cols)).all(|col| self.pixel(row, col) == other.pixel(row, col))
        })
    }
}
