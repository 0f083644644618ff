//! Decoding, resizing and encoding of raster images

use std::io::Cursor;

use fillcheck_types::{Error, ImageRole, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};

/// Resampling filter used whenever an image is resized (bilinear)
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Decode raw bytes of any supported raster format
pub fn decode(bytes: &[u8], role: ImageRole) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::Decode {
        input: role,
        message: e.to_string(),
    })
}

/// Decode and convert to 3-channel RGB, no resizing
pub fn normalize(bytes: &[u8], role: ImageRole) -> Result<RgbImage> {
    Ok(decode(bytes, role)?.to_rgb8())
}

/// Decode, convert to RGB and resize to `size` x `size`.
///
/// Images already at the target size are returned as decoded.
pub fn normalize_square(bytes: &[u8], role: ImageRole, size: u32) -> Result<RgbImage> {
    let rgb = normalize(bytes, role)?;
    Ok(resize_square(rgb, size))
}

pub fn resize_square(image: RgbImage, size: u32) -> RgbImage {
    if image.width() == size && image.height() == size {
        return image;
    }
    imageops::resize(&image, size, size, RESIZE_FILTER)
}

/// Encode as JPEG for downstream display
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(image)?;
    Ok(buf)
}

/// Encode as PNG (lossless)
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_garbage_bytes_fail_with_decode() {
        let err = normalize(b"not image!", ImageRole::Current).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                input: ImageRole::Current,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_png_fails_with_decode() {
        let img = RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]));
        let png = encode_png(&img).unwrap();
        let truncated = &png[..png.len() / 2];
        assert!(matches!(
            normalize(truncated, ImageRole::Reference),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 80, 7]));
        let decoded = normalize(&encode_png(&img).unwrap(), ImageRole::Bottle).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_normalize_square_resizes() {
        let img = RgbImage::from_pixel(300, 120, Rgb([200, 100, 50]));
        let out = normalize_square(&encode_png(&img).unwrap(), ImageRole::Current, 224).unwrap();
        assert_eq!(out.dimensions(), (224, 224));
        // Uniform input stays uniform under bilinear resampling
        assert_eq!(*out.get_pixel(100, 100), Rgb([200, 100, 50]));
    }

    #[test]
    fn test_normalize_square_passthrough() {
        let img = RgbImage::from_fn(224, 224, |x, y| Rgb([((x + y) % 2 * 255) as u8, 0, 0]));
        let out = normalize_square(&encode_png(&img).unwrap(), ImageRole::Current, 224).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg() {
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let bytes = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
