//! Latest-frame storage and frame decoding
//!
//! Clients stream camera frames as base64 (optionally wrapped in a data
//! URL). Only the most recent frame is kept; every frame event overwrites
//! the previous one (last-writer-wins across all connected clients).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use parking_lot::RwLock;
use thiserror::Error;

/// Frame decoding errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Single most-recently-received frame, process-wide.
///
/// Stored as received (base64 or data URL); decoding happens lazily on the
/// vision path so a malformed frame never fails frame ingestion itself.
#[derive(Default)]
pub struct FrameCell {
    inner: RwLock<Option<String>>,
}

impl FrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored frame
    pub fn store(&self, payload: impl Into<String>) {
        *self.inner.write() = Some(payload.into());
    }

    /// Get the current frame payload, if any
    pub fn load(&self) -> Option<String> {
        self.inner.read().clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Drop the stored frame
    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

/// A decoded, validated frame ready to hand to a vision model
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Detected MIME type
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Decode a frame payload into validated image bytes.
///
/// Accepts plain base64 or a `data:image/...;base64,` URL. The bytes must
/// parse as an image; anything else is a [`FrameError`] and the caller is
/// expected to skip the vision path rather than fail the turn.
pub fn decode_frame(payload: &str) -> Result<DecodedFrame, FrameError> {
    let encoded = strip_data_url_prefix(payload);
    let bytes = BASE64.decode(encoded.trim())?;

    let img = image::load_from_memory(&bytes)?;
    let mime_type = image::guess_format(&bytes)
        .map(format_mime)
        .unwrap_or("image/png")
        .to_string();

    Ok(DecodedFrame {
        mime_type,
        width: img.width(),
        height: img.height(),
        bytes,
    })
}

/// Strip a leading `data:<mime>;base64,` prefix if present
fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some(idx) = payload.find("base64,") {
            return &payload[idx + "base64,".len()..];
        }
    }
    payload
}

fn format_mime(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 transparent PNG
    const PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_frame_cell_overwrite() {
        let cell = FrameCell::new();
        assert!(!cell.is_present());

        cell.store("first");
        cell.store("second");
        assert_eq!(cell.load().as_deref(), Some("second"));

        cell.clear();
        assert!(cell.load().is_none());
    }

    #[test]
    fn test_decode_plain_base64() {
        let frame = decode_frame(PNG_B64).unwrap();
        assert_eq!(frame.mime_type, "image/png");
        assert_eq!((frame.width, frame.height), (1, 1));
        assert!(!frame.bytes.is_empty());
    }

    #[test]
    fn test_decode_data_url() {
        let payload = format!("data:image/png;base64,{PNG_B64}");
        let frame = decode_frame(&payload).unwrap();
        assert_eq!(frame.mime_type, "image/png");
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(matches!(
            decode_frame("not@@base64!!"),
            Err(FrameError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_not_an_image() {
        let payload = BASE64.encode(b"plain text, not an image");
        assert!(matches!(decode_frame(&payload), Err(FrameError::Image(_))));
    }
}
