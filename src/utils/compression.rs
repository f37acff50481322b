use crate::config::MAX_PACKET_SIZE;
use crate::error::{ProtocolError, Result};
use crate::protocol::frame::{Frame, PixelOrder};
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder};
use std::io::Cursor;

/// Upper bound on decoded pixel bytes; a JPEG may not inflate past what a raw
/// image packet of maximum size could carry.
const MAX_DECOMPRESSION_SIZE: usize = MAX_PACKET_SIZE;

/// JPEG-encode a frame at the given quality (1-100)
///
/// Compression is lossy; a round trip reproduces the frame only within a
/// per-channel tolerance that depends on `quality` and image content.
///
/// # Errors
/// Returns `ProtocolError::CompressionFailure` if the frame is empty or the
/// encoder rejects the input.
pub fn compress_frame(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    if frame.is_empty() {
        return Err(ProtocolError::CompressionFailure(
            "cannot JPEG-encode an empty frame".to_string(),
        ));
    }

    let rgb = frame.with_order(PixelOrder::Rgb);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode(
            rgb.as_raw(),
            u32::from(frame.cols()),
            u32::from(frame.rows()),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ProtocolError::CompressionFailure(e.to_string()))?;
    Ok(out)
}

/// Decode a self-describing JPEG stream into a frame laid out in `order`
///
/// Grayscale or CMYK streams are converted to 3-channel colour.
///
/// # Errors
/// Returns `ProtocolError::DecompressionFailure` if:
/// - the bytes are not a decodable JPEG stream
/// - the dimensions in the JPEG header would decode past MAX_DECOMPRESSION_SIZE
///
/// Returns `ProtocolError::FrameTooLarge` if the decoded dimensions do not fit
/// the 16-bit row/column fields.
pub fn decompress_frame(data: &[u8], order: PixelOrder) -> Result<Frame> {
    decompress_frame_within(data, order, MAX_DECOMPRESSION_SIZE)
}

fn decompress_frame_within(data: &[u8], order: PixelOrder, max_bytes: usize) -> Result<Frame> {
    let decoder = JpegDecoder::new(Cursor::new(data))
        .map_err(|e| ProtocolError::DecompressionFailure(e.to_string()))?;

    // Reject on the header's claimed size before any pixel buffer is allocated
    let (width, height) = decoder.dimensions();
    let claimed = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(3);
    if claimed > max_bytes {
        return Err(ProtocolError::DecompressionFailure(format!(
            "JPEG of {width}x{height} pixels ({claimed} bytes) exceeds limit of {max_bytes}"
        )));
    }

    let decoded = DynamicImage::from_decoder(decoder)
        .map_err(|e| ProtocolError::DecompressionFailure(e.to_string()))?
        .to_rgb8();

    Frame::from_rgb_image(&decoded, order)
}
