//! Image normalization and size-bounded compression
//!
//! Incoming photos are decoded and re-encoded as JPEG, which drops EXIF
//! metadata so a stale rotation flag cannot disagree with the pixel data.
//! Encoding walks a fixed attempt ladder toward the size target; the final
//! rung is accepted whatever size it produces.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use shelfmark_common::{Error, Result};

/// Hard ceiling on the original input; larger files are rejected outright,
/// never compressed
pub const MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Encoded-size target for the compression ladder
pub const TARGET_BYTES: usize = 300 * 1024;

/// Fixed attempt ladder: (max dimension, JPEG quality)
const ATTEMPTS: [(u32, u8); 4] = [(1200, 70), (800, 60), (600, 50), (400, 40)];

/// Result of a compression run
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Ladder rungs used (1-based; at most 4)
    pub attempts: u32,
}

/// Validate, normalize, and compress a user-supplied image.
///
/// CPU-bound; callers run it under `spawn_blocking`.
pub fn compress_image(input: &[u8]) -> Result<CompressedImage> {
    if input.len() > MAX_INPUT_BYTES {
        return Err(Error::InvalidInput(format!(
            "Image is {} bytes; the limit is {} bytes",
            input.len(),
            MAX_INPUT_BYTES
        )));
    }

    let kind = infer::get(input)
        .ok_or_else(|| Error::InvalidInput("Unrecognized file type".to_string()))?;
    if !kind.mime_type().starts_with("image/") {
        return Err(Error::InvalidInput(format!(
            "Expected an image, got {}",
            kind.mime_type()
        )));
    }

    let source = image::load_from_memory(input)
        .map_err(|e| Error::InvalidInput(format!("Image decode failed: {}", e)))?;

    let mut attempt = 0;
    loop {
        let (max_dim, quality) = ATTEMPTS[attempt];
        let resized = if source.width().max(source.height()) > max_dim {
            source.thumbnail(max_dim, max_dim)
        } else {
            source.clone()
        };
        let bytes = encode_jpeg(&resized, quality)?;

        if bytes.len() <= TARGET_BYTES || attempt + 1 == ATTEMPTS.len() {
            return Ok(CompressedImage {
                width: resized.width(),
                height: resized.height(),
                bytes,
                attempts: attempt as u32 + 1,
            });
        }
        attempt += 1;
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| Error::Internal(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    /// Deterministic per-pixel noise; defeats compression well enough to
    /// exercise the ladder
    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed: u32 = 0x2545_f491;
        let img = ImageBuffer::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let bytes = seed.to_le_bytes();
            Rgb([bytes[0], bytes[1], bytes[2]])
        });
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("Failed to encode test PNG");
        buf
    }

    fn solid_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([120u8, 80, 40]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("Failed to encode test PNG");
        buf
    }

    #[test]
    fn test_oversized_input_rejected_before_compression() {
        let input = vec![0u8; MAX_INPUT_BYTES + 1];
        let result = compress_image(&input);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_non_image_input_rejected() {
        let result = compress_image(b"%PDF-1.4 not an image at all");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_small_image_passes_on_first_attempt() {
        let input = solid_png(200, 300);
        let compressed = compress_image(&input).expect("Compression failed");

        assert_eq!(compressed.attempts, 1);
        assert!(compressed.bytes.len() <= TARGET_BYTES);
        // Small images are re-encoded, not enlarged
        assert_eq!((compressed.width, compressed.height), (200, 300));
        // Output is JPEG regardless of input format
        assert_eq!(&compressed.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_large_noisy_input_is_not_rejected_and_ladder_terminates() {
        // Noise PNG of ~4 MB: under the 5 MB ceiling, so it must be
        // compressed, not rejected
        let input = noise_png(1200, 1100);
        assert!(input.len() <= MAX_INPUT_BYTES, "test image unexpectedly large");

        let compressed = compress_image(&input).expect("Compression failed");

        assert!(compressed.attempts >= 1 && compressed.attempts <= 4);
        assert!(compressed.width.max(compressed.height) <= 1200);
        // Only the final rung may miss the target
        if compressed.bytes.len() > TARGET_BYTES {
            assert_eq!(compressed.attempts, 4);
            assert!(compressed.width.max(compressed.height) <= 400);
        }
    }

    #[test]
    fn test_dimensions_shrink_down_the_ladder() {
        let input = noise_png(2400, 1600);
        let compressed = compress_image(&input).expect("Compression failed");

        // First rung caps the longest side at 1200
        assert!(compressed.width.max(compressed.height) <= 1200);
        // Aspect ratio is preserved
        let ratio = compressed.width as f64 / compressed.height as f64;
        assert!((ratio - 1.5).abs() < 0.01, "aspect ratio drifted: {}", ratio);
    }
}
