//! Color space helpers

use image::{GrayImage, Luma, Rgb, RgbImage};

/// BT.601 luma, rounded
pub fn luma(p: &Rgb<u8>) -> u8 {
    let [r, g, b] = p.0;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// Grayscale conversion with BT.601 weights
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(image.get_pixel(x, y))])
    })
}

/// RGB to HSV in the OpenCV 8-bit convention: H in 0..=180, S and V in 0..=255
pub fn rgb_to_hsv(p: &Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = p.0.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let mut h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round() as u8, s.round() as u8, v as u8]
}
