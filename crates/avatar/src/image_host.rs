//! Public image host client
//!
//! The avatar provider only accepts publicly reachable image URLs, so an
//! uploaded avatar image is re-published to an ImgBB-style host first.
//! Oversized images are optimized (RGB, bounded dimensions, JPEG) before
//! upload. A missing API key disables publishing entirely; that is a valid
//! outcome the caller handles by keeping the default avatar.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use reqwest::Client;

use crate::AvatarError;

/// Configuration for the image host client
#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// API key (from IMGBB_API_KEY or direct); empty disables publishing
    pub api_key: String,
    /// Upload endpoint
    pub endpoint: String,
    /// Upload attempts before giving up
    pub max_attempts: u32,
    /// Pause between retries
    pub retry_pause: Duration,
    /// Size above which images are re-encoded before upload
    pub optimize_above_bytes: usize,
    /// Longest dimension after optimization
    pub max_dimension: u32,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("IMGBB_API_KEY").unwrap_or_default(),
            endpoint: "https://api.imgbb.com/1/upload".to_string(),
            max_attempts: 3,
            retry_pause: Duration::from_secs(1),
            optimize_above_bytes: 5 * 1024 * 1024,
            max_dimension: 1920,
        }
    }
}

/// Image host client
pub struct ImageHostClient {
    config: ImageHostConfig,
    client: Client,
}

impl ImageHostClient {
    pub fn new(config: ImageHostConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Whether a host API key is configured
    pub fn configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Publish a local image, returning its public URL.
    ///
    /// `None` covers every failure: missing credential, unreadable file,
    /// exhausted upload attempts. Callers treat absence as a valid state.
    pub async fn publish(&self, path: &Path) -> Option<String> {
        if !self.configured() {
            tracing::debug!("Image host not configured, skipping publish");
            return None;
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read image");
                return None;
            }
        };

        let bytes = match optimize_image(
            bytes,
            self.config.optimize_above_bytes,
            self.config.max_dimension,
        ) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Image optimization failed");
                return None;
            }
        };

        let encoded = BASE64.encode(&bytes);

        for attempt in 1..=self.config.max_attempts {
            match self.try_upload(&encoded).await {
                Ok(url) => {
                    tracing::info!(url = %url, "Image published");
                    return Some(url);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Image upload attempt failed"
                    );
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.retry_pause).await;
                    }
                }
            }
        }

        None
    }

    async fn try_upload(&self, encoded: &str) -> Result<String, AvatarError> {
        let params = [("key", self.config.api_key.as_str()), ("image", encoded)];

        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&params)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AvatarError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AvatarError::InvalidResponse(e.to_string()))?;

        if !body
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            let message = body
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(AvatarError::Api(message.to_string()));
        }

        body.pointer("/data/url")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AvatarError::InvalidResponse("No url in upload response".to_string()))
    }
}

/// Re-encode an image when it exceeds `max_bytes`: drop alpha, cap the
/// longest dimension at `max_dimension`, JPEG quality 85. Smaller images
/// pass through untouched.
pub fn optimize_image(
    bytes: Vec<u8>,
    max_bytes: usize,
    max_dimension: u32,
) -> Result<Vec<u8>, AvatarError> {
    if bytes.len() <= max_bytes {
        return Ok(bytes);
    }

    let img = image::load_from_memory(&bytes)
        .map_err(|e| AvatarError::InvalidResponse(format!("Not an image: {e}")))?;

    let img = if img.width().max(img.height()) > max_dimension {
        img.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, 85);
    encoder
        .encode_image(&rgb)
        .map_err(|e| AvatarError::InvalidResponse(format!("JPEG encode failed: {e}")))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_small_image_passes_through() {
        let bytes = sample_png(8, 8);
        let out = optimize_image(bytes.clone(), 1024 * 1024, 1920).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_oversized_image_reencoded_as_jpeg() {
        let bytes = sample_png(64, 32);
        // Force the optimization path with a tiny threshold
        let out = optimize_image(bytes, 1, 1920).unwrap();

        let format = image::guess_format(&out).unwrap();
        assert_eq!(format, image::ImageFormat::Jpeg);

        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (64, 32));
    }

    #[test]
    fn test_large_dimensions_capped() {
        let bytes = sample_png(400, 200);
        let out = optimize_image(bytes, 1, 100).unwrap();

        let img = image::load_from_memory(&out).unwrap();
        assert!(img.width() <= 100 && img.height() <= 100);
        // Aspect ratio preserved by the resize
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
    }

    #[test]
    fn test_not_an_image_rejected() {
        let out = optimize_image(b"definitely not an image".to_vec(), 1, 1920);
        assert!(out.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_host_returns_none() {
        let client = ImageHostClient::new(ImageHostConfig {
            api_key: String::new(),
            ..Default::default()
        });
        assert!(!client.configured());
        assert!(client.publish(Path::new("/nonexistent.jpg")).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_returns_none() {
        let client = ImageHostClient::new(ImageHostConfig {
            api_key: "key".to_string(),
            ..Default::default()
        });
        assert!(client.publish(Path::new("/nonexistent.jpg")).await.is_none());
    }
}
