//! Kitchen zone waste scoring over a blurred intensity heatmap.
//!
//! The photo is reduced to grayscale in [0, 1] and smoothed with a wide
//! Gaussian. Each zone's score is a weighted mix of the heatmap mean and peak
//! inside its rectangle, scaled by a per-station factor.

use fillcheck_types::{Error, FeatureVector, Result};
use image::{ImageBuffer, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::to_gray;

/// Standard deviation of the heatmap blur, in pixels
pub const HEATMAP_SIGMA: f32 = 10.0;
pub const MEAN_WEIGHT: f64 = 0.7;
pub const PEAK_WEIGHT: f64 = 0.3;

pub type Heatmap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Scale applied to a station's score; stations not listed score unscaled
pub fn zone_factor(name: &str) -> f64 {
    match name {
        "prep_station" => 1.2,
        "cooking_station" => 1.1,
        "dishwashing" => 0.9,
        _ => 1.0,
    }
}

/// Rectangle in image pixels as drawn by the user; may extend past the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ZoneRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    /// Clip to a `width` x `height` image.
    ///
    /// The origin is clamped onto the image, then the extent is cut at the
    /// right and bottom edges. Returns `(x, y, w, h)`, or None when nothing
    /// remains.
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let (img_w, img_h) = (i64::from(width), i64::from(height));
        let x = self.x.clamp(0, img_w - 1);
        let y = self.y.clamp(0, img_h - 1);
        let w = self.width.min(img_w - x);
        let h = self.height.min(img_h - y);
        if w <= 0 || h <= 0 {
            return None;
        }
        // All four values are within the image bounds here
        Some((x as u32, y as u32, w as u32, h as u32))
    }
}

/// A named station of the kitchen floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenZone {
    pub name: String,
    pub rect: ZoneRect,
}

impl KitchenZone {
    pub fn new(name: impl Into<String>, rect: ZoneRect) -> Self {
        Self {
            name: name.into(),
            rect,
        }
    }

    pub fn factor(&self) -> f64 {
        zone_factor(&self.name)
    }
}

/// Score of one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneScore {
    pub zone: String,
    pub score: f64,
    /// Clipped rectangle actually measured, None when it fell outside the image
    pub clipped: Option<(u32, u32, u32, u32)>,
    pub diagnostics: FeatureVector,
}

/// Scores for every requested zone, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenReport {
    pub zones: Vec<ZoneScore>,
    pub total: f64,
}

/// Grayscale normalized to [0, 1], blurred with `sigma`
pub fn waste_heatmap(image: &RgbImage, sigma: f32) -> Result<Heatmap> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "heatmap sigma must be positive, got {}",
            sigma
        )));
    }
    let gray = to_gray(image);
    let normalized = Heatmap::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([f32::from(gray.get_pixel(x, y)[0]) / 255.0])
    });
    Ok(gaussian_blur_f32(&normalized, sigma))
}

/// Score one zone against a precomputed heatmap
pub fn score_zone(heatmap: &Heatmap, zone: &KitchenZone) -> ZoneScore {
    let mut diagnostics = FeatureVector::new();
    let factor = zone.factor();
    diagnostics.insert("factor", factor);

    let Some((x, y, w, h)) = zone.rect.clip(heatmap.width(), heatmap.height()) else {
        debug!("zone {} lies outside the image", zone.name);
        return ZoneScore {
            zone: zone.name.clone(),
            score: 0.0,
            clipped: None,
            diagnostics,
        };
    };

    let mut sum = 0.0f64;
    let mut peak = f64::MIN;
    for row in y..y + h {
        for col in x..x + w {
            let v = f64::from(heatmap.get_pixel(col, row)[0]);
            sum += v;
            peak = peak.max(v);
        }
    }
    let mean = sum / (f64::from(w) * f64::from(h));
    let score = (MEAN_WEIGHT * mean + PEAK_WEIGHT * peak) * factor;

    diagnostics.insert("mean", mean);
    diagnostics.insert("peak", peak);
    ZoneScore {
        zone: zone.name.clone(),
        score,
        clipped: Some((x, y, w, h)),
        diagnostics,
    }
}

/// Score every zone of a kitchen photo
pub fn analyze_kitchen(image: &RgbImage, zones: &[KitchenZone]) -> Result<KitchenReport> {
    let heatmap = waste_heatmap(image, HEATMAP_SIGMA)?;
    let zones: Vec<ZoneScore> = zones.iter().map(|z| score_zone(&heatmap, z)).collect();
    let total = zones.iter().map(|z| z.score).sum();
    Ok(KitchenReport { zones, total })
}
