//! Shared result and diagnostic types

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which input an image was supplied as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Bottle,
    Current,
    Reference,
    Kitchen,
}

impl std::fmt::Display for ImageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRole::Bottle => write!(f, "bottle"),
            ImageRole::Current => write!(f, "current"),
            ImageRole::Reference => write!(f, "reference"),
            ImageRole::Kitchen => write!(f, "kitchen"),
        }
    }
}

/// Pipeline stage, used to tag failures for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decode,
    Segmentation,
    Scanline,
    Calibration,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Segmentation => "segmentation",
            Stage::Scanline => "scanline",
            Stage::Calibration => "calibration",
        }
    }
}

/// Flat `name -> value` mapping of the signals an estimator computed.
///
/// Serializes as a plain JSON object so downstream logging can ingest it
/// without knowing the estimator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    /// Booleans are stored as 0.0 / 1.0
    pub fn insert_flag(&mut self, name: &str, value: bool) {
        self.insert(name, if value { 1.0 } else { 0.0 });
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).map_or(false, |v| v != 0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

/// Axis-aligned rectangle in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Detected liquid band, in rows of the region below the neck cutoff.
/// `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidBand {
    pub top: u32,
    pub bottom: u32,
}

impl LiquidBand {
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// How the plate consumption ratio is computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStrategy {
    /// Five-signal weighted fusion
    #[default]
    Fused,
    /// Histogram intersection only (cheaper fallback)
    #[value(name = "histogram")]
    HistogramOnly,
}

impl std::fmt::Display for SimilarityStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityStrategy::Fused => write!(f, "fused"),
            SimilarityStrategy::HistogramOnly => write!(f, "histogram"),
        }
    }
}

/// Result of a liquid volume estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeEstimate {
    /// Liquid height as a percentage of the usable bottle height (1 decimal)
    pub percent: f64,
    /// Remaining volume in millilitres (1 decimal)
    pub volume_ml: f64,
    pub capacity_ml: f64,
    pub liquid_height_px: u32,
    pub usable_height_px: u32,
    /// Bottle bounding box in full-image coordinates
    pub bottle: BoundingBox,
    /// Liquid band in rows below the neck cutoff
    pub band: LiquidBand,
    /// Grayscale fallback was used instead of the colour band
    pub used_fallback: bool,
    pub diagnostics: FeatureVector,
}

/// Result of a plate consumption estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionEstimate {
    pub strategy: SimilarityStrategy,
    pub full_weight: f64,
    /// Consumed fraction in [ratio_min, ratio_max]
    pub consumption_ratio: f64,
    pub consumed_weight: f64,
    pub wasted_weight: f64,
    pub consumed_percent: f64,
    pub wasted_percent: f64,
    /// Food-area fallback or clamp engaged
    pub used_fallback: bool,
    pub diagnostics: FeatureVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_serializes_flat() {
        let mut fv = FeatureVector::new();
        fv.insert("ssim_score", 0.5);
        fv.insert_flag("used_fallback", true);
        let json = serde_json::to_string(&fv).unwrap();
        assert_eq!(json, r#"{"ssim_score":0.5,"used_fallback":1.0}"#);
        assert!(fv.flag("used_fallback"));
        assert!(!fv.flag("missing"));
    }

    #[test]
    fn test_liquid_band_height() {
        let band = LiquidBand { top: 410, bottom: 559 };
        assert_eq!(band.height(), 149);
    }

    #[test]
    fn test_bounding_box_edges() {
        let bb = BoundingBox { x: 50, y: 50, width: 300, height: 700 };
        assert_eq!(bb.right(), 350);
        assert_eq!(bb.bottom(), 750);
    }
}
