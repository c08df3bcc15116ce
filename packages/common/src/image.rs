//! Upload-time image normalization: bounded dimensions and re-encoding.
//!
//! Only JPEG, PNG and WebP are touched. Everything else, and anything the
//! codec fails on, passes through byte-for-byte.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::config::ImageConfig;

#[derive(Debug, thiserror::Error)]
enum NormalizeError {
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

/// Result of running an upload through the normalizer.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub resized: bool,
}

impl Normalized {
    fn unchanged(bytes: Vec<u8>, content_type: &str) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            content_type: content_type.to_string(),
            original_size: size,
            compressed_size: size,
            resized: false,
        }
    }
}

/// Stateless image normalizer. CPU-bound; call it from a blocking thread.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    config: ImageConfig,
}

/// Map a MIME type to a format the normalizer re-encodes.
pub fn supported_format(content_type: &str) -> Option<ImageFormat> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

impl ImageNormalizer {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Whether uploads are compressed when the request leaves it unspecified.
    pub fn compress_by_default(&self) -> bool {
        self.config.compress
    }

    /// Downscale and re-encode `content` if it is a supported image.
    ///
    /// Never fails: codec errors are logged and the input is returned as-is.
    pub fn normalize(&self, content: Vec<u8>, content_type: &str) -> Normalized {
        let Some(format) = supported_format(content_type) else {
            return Normalized::unchanged(content, content_type);
        };

        let original_size = content.len() as u64;
        match self.reencode(&content, format) {
            Ok(Some((bytes, resized))) => {
                tracing::debug!(
                    original_size,
                    compressed_size = bytes.len(),
                    resized,
                    "Image normalized"
                );
                Normalized {
                    compressed_size: bytes.len() as u64,
                    bytes,
                    content_type: content_type.to_string(),
                    original_size,
                    resized,
                }
            }
            Ok(None) => Normalized::unchanged(content, content_type),
            Err(e) => {
                tracing::warn!(error = %e, content_type, "Image normalization failed, keeping original");
                Normalized::unchanged(content, content_type)
            }
        }
    }

    /// Returns `None` when re-encoding would only make an unresized image larger.
    fn reencode(
        &self,
        content: &[u8],
        format: ImageFormat,
    ) -> Result<Option<(Vec<u8>, bool)>, NormalizeError> {
        let mut img = image::load_from_memory_with_format(content, format)?;

        let max = self.config.max_dimension.max(1);
        let (width, height) = img.dimensions();
        let resized = width > max || height > max;
        if resized {
            img = img.resize(max, max, FilterType::Lanczos3);
        }

        let mut buf = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder =
                    JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality.clamp(1, 100));
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    png_compression(self.config.png_compression),
                    PngFilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
            }
            ImageFormat::WebP => {
                let encoder = WebPEncoder::new_lossless(&mut buf);
                let img = if img.color().has_alpha() {
                    DynamicImage::ImageRgba8(img.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(img.to_rgb8())
                };
                img.write_with_encoder(encoder)?;
            }
            _ => return Ok(None),
        }

        if !resized && buf.len() >= content.len() {
            return Ok(None);
        }
        Ok(Some((buf, resized)))
    }
}
