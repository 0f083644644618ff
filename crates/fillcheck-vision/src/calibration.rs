//! Calibration constants for both estimators.
//!
//! A profile is plain data: loaded (or taken from [`CalibrationProfile::standard`])
//! once and shared read-only by every estimation call.

use fillcheck_types::{Error, Result, SimilarityStrategy};
use serde::{Deserialize, Serialize};

/// Lower clamp for the consumption ratio. Empirical, tuned on food photography.
pub const RATIO_MIN: f64 = 0.1;
/// Upper clamp for the consumption ratio. Empirical, tuned on food photography.
pub const RATIO_MAX: f64 = 0.9;
/// Default bottle capacity when the caller supplies none
pub const DEFAULT_CAPACITY_ML: f64 = 750.0;
/// Fraction of the bottle height treated as neck and never measured
pub const NECK_FRACTION: f64 = 0.2;

static STANDARD_PROFILE: CalibrationProfile = CalibrationProfile {
    volume: VolumeCalibration::STANDARD,
    consumption: ConsumptionCalibration::STANDARD,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationProfile {
    pub volume: VolumeCalibration,
    pub consumption: ConsumptionCalibration,
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        STANDARD_PROFILE.clone()
    }
}

impl CalibrationProfile {
    /// The built-in process-wide profile
    pub fn standard() -> &'static CalibrationProfile {
        &STANDARD_PROFILE
    }

    pub fn validate(&self) -> Result<()> {
        self.volume.validate()?;
        self.consumption.validate()
    }
}

/// Constants of the liquid volume pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeCalibration {
    pub neck_fraction: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Closing radius (L-inf), 2 = 5x5 square
    pub close_radius: u8,
    /// Opening radius (L-inf), 1 = 3x3 square
    pub open_radius: u8,
    pub saturation_scale: f32,
    /// Inclusive HSV band, OpenCV 8-bit convention (H in 0..180)
    pub liquid_hsv_lower: [u8; 3],
    pub liquid_hsv_upper: [u8; 3],
    /// Below this many colour-matched pixels the grayscale fallback is used
    pub min_color_pixels: u32,
    /// Grayscale pixels at or below this value count as liquid in the fallback
    pub gray_fallback_cutoff: u8,
    /// Row threshold = max(row_fraction * width, row_min_pixels)
    pub row_fraction: f64,
    pub row_min_pixels: f64,
    pub min_band_height_px: u32,
}

impl VolumeCalibration {
    pub const STANDARD: VolumeCalibration = VolumeCalibration {
        neck_fraction: NECK_FRACTION,
        canny_low: 50.0,
        canny_high: 150.0,
        close_radius: 2,
        open_radius: 1,
        saturation_scale: 0.5,
        liquid_hsv_lower: [5, 30, 30],
        liquid_hsv_upper: [40, 255, 255],
        min_color_pixels: 100,
        gray_fallback_cutoff: 100,
        row_fraction: 0.1,
        row_min_pixels: 20.0,
        min_band_height_px: 10,
    };

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.neck_fraction) {
            return Err(invalid(format!(
                "neck_fraction must be in [0, 1), got {}",
                self.neck_fraction
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(invalid(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if (0..3).any(|i| self.liquid_hsv_lower[i] > self.liquid_hsv_upper[i]) {
            return Err(invalid("liquid HSV lower bound exceeds upper bound".to_string()));
        }
        if self.row_fraction < 0.0 || self.row_min_pixels < 0.0 {
            return Err(invalid("row thresholds must be non-negative".to_string()));
        }
        Ok(())
    }
}

impl Default for VolumeCalibration {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Weights of the five fused consumption signals; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionWeights {
    pub histogram: f64,
    pub ssim: f64,
    pub mse: f64,
    pub brightness: f64,
    pub food_area: f64,
}

impl FusionWeights {
    pub const STANDARD: FusionWeights = FusionWeights {
        histogram: 0.30,
        ssim: 0.20,
        mse: 0.15,
        brightness: 0.15,
        food_area: 0.20,
    };

    pub fn sum(&self) -> f64 {
        self.histogram + self.ssim + self.mse + self.brightness + self.food_area
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Constants of the plate consumption estimator, shared by both strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionCalibration {
    /// Both images are resized to `input_size` x `input_size`
    pub input_size: u32,
    pub histogram_bins: u32,
    pub weights: FusionWeights,
    pub fused_exponent: f64,
    pub histogram_exponent: f64,
    pub ratio_min: f64,
    pub ratio_max: f64,
    /// Grayscale values below this are food, the rest plate/background
    pub background_cutoff: u8,
    pub food_area_min: f64,
    pub food_area_max: f64,
    pub ssim_window: u32,
    pub ssim_k1: f64,
    pub ssim_k2: f64,
}

impl ConsumptionCalibration {
    pub const STANDARD: ConsumptionCalibration = ConsumptionCalibration {
        input_size: 224,
        histogram_bins: 64,
        weights: FusionWeights::STANDARD,
        fused_exponent: 0.8,
        histogram_exponent: 0.7,
        ratio_min: RATIO_MIN,
        ratio_max: RATIO_MAX,
        background_cutoff: 230,
        food_area_min: 0.1,
        food_area_max: 1.0,
        ssim_window: 7,
        ssim_k1: 0.01,
        ssim_k2: 0.03,
    };

    pub fn exponent(&self, strategy: SimilarityStrategy) -> f64 {
        match strategy {
            SimilarityStrategy::Fused => self.fused_exponent,
            SimilarityStrategy::HistogramOnly => self.histogram_exponent,
        }
    }

    /// Non-linear spread `raw^exponent`, then clamp to `[ratio_min, ratio_max]`
    pub fn spread_and_clamp(&self, raw: f64, strategy: SimilarityStrategy) -> f64 {
        raw.max(0.0)
            .powf(self.exponent(strategy))
            .clamp(self.ratio_min, self.ratio_max)
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(invalid(format!("fusion weights must sum to 1.0, got {:.6}", sum)));
        }
        if self.input_size == 0 || self.histogram_bins == 0 || self.histogram_bins > 256 {
            return Err(invalid(format!(
                "input_size ({}) and histogram_bins ({}) must be positive, bins at most 256",
                self.input_size, self.histogram_bins
            )));
        }
        if self.fused_exponent <= 0.0 || self.histogram_exponent <= 0.0 {
            return Err(invalid("spread exponents must be positive".to_string()));
        }
        if !(0.0 <= self.ratio_min && self.ratio_min < self.ratio_max && self.ratio_max <= 1.0) {
            return Err(invalid(format!(
                "ratio clamp [{}, {}] must satisfy 0 <= min < max <= 1",
                self.ratio_min, self.ratio_max
            )));
        }
        if !(self.food_area_min <= self.food_area_max) {
            return Err(invalid("food_area_min exceeds food_area_max".to_string()));
        }
        if self.ssim_window < 2 || self.ssim_window > self.input_size {
            return Err(invalid(format!(
                "ssim_window must be in [2, input_size = {}], got {}",
                self.input_size, self.ssim_window
            )));
        }
        Ok(())
    }
}

impl Default for ConsumptionCalibration {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidParameter(message)
}
