//! Liquid mask extraction inside the bottle region

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use log::warn;

use crate::calibration::VolumeCalibration;
use crate::color::{luma, rgb_to_hsv};

/// Binary liquid mask (0 / 255) over the bottle region
#[derive(Debug, Clone)]
pub struct LiquidMask {
    pub mask: GrayImage,
    /// Pixels matching the colour band before any fallback or masking
    pub color_pixels: u32,
    pub used_fallback: bool,
}

/// Build the liquid mask for `roi`.
///
/// The colour band is matched on HSV with damped saturation. When fewer than
/// `min_color_pixels` match, dark grayscale pixels are taken instead. The
/// result is restricted to `bottle_mask`, then closed and opened.
pub fn extract_liquid_mask(
    roi: &RgbImage,
    bottle_mask: &GrayImage,
    calibration: &VolumeCalibration,
) -> LiquidMask {
    let (width, height) = roi.dimensions();
    let lower = calibration.liquid_hsv_lower;
    let upper = calibration.liquid_hsv_upper;

    let mut color = GrayImage::new(width, height);
    let mut color_pixels = 0u32;
    for (x, y, px) in roi.enumerate_pixels() {
        let [h, s, v] = rgb_to_hsv(px);
        let s = (s as f32 * calibration.saturation_scale) as u8;
        let hsv = [h, s, v];
        if (0..3).all(|i| lower[i] <= hsv[i] && hsv[i] <= upper[i]) {
            color.put_pixel(x, y, Luma([255]));
            color_pixels += 1;
        }
    }

    let used_fallback = color_pixels < calibration.min_color_pixels;
    let mut mask = if used_fallback {
        warn!(
            "liquid mask: only {} colour-matched pixels, falling back to grayscale cutoff {}",
            color_pixels, calibration.gray_fallback_cutoff
        );
        let cutoff = calibration.gray_fallback_cutoff;
        GrayImage::from_fn(width, height, |x, y| {
            if luma(roi.get_pixel(x, y)) <= cutoff {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    } else {
        color
    };

    for (x, y, px) in mask.enumerate_pixels_mut() {
        let inside = x < bottle_mask.width()
            && y < bottle_mask.height()
            && bottle_mask.get_pixel(x, y)[0] > 0;
        if !inside {
            *px = Luma([0]);
        }
    }

    let closed = close(&mask, Norm::LInf, calibration.close_radius);
    let cleaned = open(&closed, Norm::LInf, calibration.open_radius);

    LiquidMask {
        mask: cleaned,
        color_pixels,
        used_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const AMBER: Rgb<u8> = Rgb([200, 110, 20]);

    fn full_mask(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([255]))
    }

    fn lit(mask: &GrayImage, y: u32) -> usize {
        (0..mask.width()).filter(|&x| mask.get_pixel(x, y)[0] > 0).count()
    }

    #[test]
    fn test_amber_rows_detected_by_colour() {
        let mut roi = RgbImage::from_pixel(60, 80, Rgb([150, 150, 150]));
        for y in 50..80 {
            for x in 0..60 {
                roi.put_pixel(x, y, AMBER);
            }
        }
        let result = extract_liquid_mask(&roi, &full_mask(60, 80), &VolumeCalibration::STANDARD);
        assert!(!result.used_fallback);
        assert_eq!(result.color_pixels, 60 * 30);
        assert_eq!(lit(&result.mask, 10), 0);
        assert_eq!(lit(&result.mask, 65), 60);
    }

    #[test]
    fn test_dark_liquid_uses_grayscale_fallback() {
        let mut roi = RgbImage::from_pixel(60, 80, Rgb([150, 150, 150]));
        for y in 40..80 {
            for x in 0..60 {
                roi.put_pixel(x, y, Rgb([40, 40, 60]));
            }
        }
        let result = extract_liquid_mask(&roi, &full_mask(60, 80), &VolumeCalibration::STANDARD);
        assert!(result.used_fallback);
        assert_eq!(lit(&result.mask, 20), 0);
        assert_eq!(lit(&result.mask, 60), 60);
    }

    #[test]
    fn test_bottle_mask_restricts_liquid() {
        let roi = RgbImage::from_pixel(60, 40, AMBER);
        let mut bottle = GrayImage::new(60, 40);
        for y in 0..40 {
            for x in 20..40 {
                bottle.put_pixel(x, y, Luma([255]));
            }
        }
        let result = extract_liquid_mask(&roi, &bottle, &VolumeCalibration::STANDARD);
        assert_eq!(result.mask.get_pixel(5, 20)[0], 0);
        assert_eq!(result.mask.get_pixel(30, 20)[0], 255);
    }

    #[test]
    fn test_isolated_speckle_removed_by_opening() {
        let mut roi = RgbImage::from_pixel(60, 60, Rgb([150, 150, 150]));
        for y in 30..60 {
            for x in 0..60 {
                roi.put_pixel(x, y, AMBER);
            }
        }
        roi.put_pixel(10, 5, AMBER);
        let result = extract_liquid_mask(&roi, &full_mask(60, 60), &VolumeCalibration::STANDARD);
        assert_eq!(result.mask.get_pixel(10, 5)[0], 0);
    }
}
