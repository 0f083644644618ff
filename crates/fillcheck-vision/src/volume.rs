//! Liquid volume estimation: segmentation, mask, scanline, linear calibration

use fillcheck_types::{Error, FeatureVector, ImageRole, Result, VolumeEstimate};
use image::RgbImage;
use log::debug;

use crate::annotate::annotate_volume;
use crate::calibration::{CalibrationProfile, VolumeCalibration};
use crate::liquid::extract_liquid_mask;
use crate::normalize::normalize;
use crate::scanline::{detect_liquid_band, row_projection, row_threshold};
use crate::segment::segment_bottle;

/// Maps a fill fraction of the usable height to a fraction of capacity.
///
/// Bottles with taper or shoulders can plug in their own curve; the default
/// assumes a uniform cross-section.
pub trait VolumeCurve: Send + Sync {
    fn volume_fraction(&self, height_fraction: f64) -> f64;
}

/// Identity curve: volume is proportional to liquid height
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCurve;

impl VolumeCurve for LinearCurve {
    fn volume_fraction(&self, height_fraction: f64) -> f64 {
        height_fraction
    }
}

/// Calibration curve interpolated between measured `(height, volume)` fractions
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinearCurve {
    points: Vec<(f64, f64)>,
}

impl PiecewiseLinearCurve {
    /// Points must be strictly increasing in height and non-decreasing in
    /// volume, all within [0, 1]. The endpoints (0,0) and (1,1) are implied.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        let mut all = Vec::with_capacity(points.len() + 2);
        all.push((0.0, 0.0));
        all.extend(points);
        all.push((1.0, 1.0));
        all.dedup_by(|b, a| a.0 == b.0 && a.1 == b.1);

        for &(h, v) in &all {
            if !(0.0..=1.0).contains(&h) || !(0.0..=1.0).contains(&v) {
                return Err(Error::InvalidParameter(format!(
                    "curve point ({}, {}) outside [0, 1]",
                    h, v
                )));
            }
        }
        for pair in all.windows(2) {
            let ((h0, v0), (h1, v1)) = (pair[0], pair[1]);
            if h1 <= h0 || v1 < v0 {
                return Err(Error::InvalidParameter(format!(
                    "curve must be increasing, got ({}, {}) then ({}, {})",
                    h0, v0, h1, v1
                )));
            }
        }
        Ok(Self { points: all })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl VolumeCurve for PiecewiseLinearCurve {
    fn volume_fraction(&self, height_fraction: f64) -> f64 {
        let h = height_fraction.clamp(0.0, 1.0);
        for pair in self.points.windows(2) {
            let ((h0, v0), (h1, v1)) = (pair[0], pair[1]);
            if h <= h1 {
                return v0 + (v1 - v0) * (h - h0) / (h1 - h0);
            }
        }
        1.0
    }
}

/// Percent of usable height and volume, both rounded to 1 decimal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeCalculation {
    pub percent: f64,
    pub volume_ml: f64,
}

pub fn calculate_volume(
    liquid_height_px: u32,
    usable_height_px: u32,
    capacity_ml: f64,
    curve: &dyn VolumeCurve,
) -> Result<VolumeCalculation> {
    validate_capacity(capacity_ml)?;
    if usable_height_px == 0 {
        return Err(Error::InvalidParameter("usable height is zero".to_string()));
    }
    let fraction = liquid_height_px as f64 / usable_height_px as f64;
    Ok(VolumeCalculation {
        percent: round1(fraction * 100.0),
        volume_ml: round1(curve.volume_fraction(fraction) * capacity_ml),
    })
}

/// Estimate plus the annotated frame
#[derive(Debug, Clone)]
pub struct LiquidVolumeReport {
    pub estimate: VolumeEstimate,
    pub annotated: RgbImage,
}

/// Estimate remaining volume with the standard calibration and linear model
pub fn estimate_liquid_volume(bytes: &[u8], capacity_ml: f64) -> Result<LiquidVolumeReport> {
    estimate_liquid_volume_with(
        bytes,
        capacity_ml,
        &CalibrationProfile::standard().volume,
        &LinearCurve,
    )
}

pub fn estimate_liquid_volume_with(
    bytes: &[u8],
    capacity_ml: f64,
    calibration: &VolumeCalibration,
    curve: &dyn VolumeCurve,
) -> Result<LiquidVolumeReport> {
    validate_capacity(capacity_ml)?;
    calibration.validate()?;
    let image = normalize(bytes, ImageRole::Bottle)?;
    measure_liquid_volume(&image, capacity_ml, calibration, curve)
}

/// Run the pipeline on an already decoded image
pub fn measure_liquid_volume(
    image: &RgbImage,
    capacity_ml: f64,
    calibration: &VolumeCalibration,
    curve: &dyn VolumeCurve,
) -> Result<LiquidVolumeReport> {
    validate_capacity(capacity_ml)?;
    calibration.validate()?;

    let region = segment_bottle(image, calibration)?;
    let liquid = extract_liquid_mask(&region.roi, &region.mask, calibration);
    let projection = row_projection(&liquid.mask);
    let band = detect_liquid_band(&projection, region.bounds.width, calibration)?;

    let liquid_height = band.height();
    let calc = calculate_volume(liquid_height, region.usable_height, capacity_ml, curve)?;
    debug!(
        "volume: band {}..{} of {} px -> {}% / {} mL (fallback: {})",
        band.top, band.bottom, region.usable_height, calc.percent, calc.volume_ml, liquid.used_fallback
    );

    let mut diagnostics = FeatureVector::new();
    diagnostics.insert("liquid_height_px", liquid_height as f64);
    diagnostics.insert("usable_height_px", region.usable_height as f64);
    diagnostics.insert("neck_offset_px", region.neck_offset as f64);
    diagnostics.insert("row_threshold", row_threshold(region.bounds.width, calibration));
    diagnostics.insert("color_pixels", liquid.color_pixels as f64);
    diagnostics.insert("contour_area", region.contour_area);
    diagnostics.insert_flag("used_fallback", liquid.used_fallback);

    let annotated = annotate_volume(image, &region.bounds, region.neck_offset, &band);

    Ok(LiquidVolumeReport {
        estimate: VolumeEstimate {
            percent: calc.percent,
            volume_ml: calc.volume_ml,
            capacity_ml,
            liquid_height_px: liquid_height,
            usable_height_px: region.usable_height,
            bottle: region.bounds,
            band,
            used_fallback: liquid.used_fallback,
            diagnostics,
        },
        annotated,
    })
}

fn validate_capacity(capacity_ml: f64) -> Result<()> {
    if !(capacity_ml.is_finite() && capacity_ml > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "capacity must be a positive number of mL, got {}",
            capacity_ml
        )));
    }
    Ok(())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario_numbers() {
        let calc = calculate_volume(150, 560, 750.0, &LinearCurve).unwrap();
        assert_eq!(calc.percent, 26.8);
        assert_eq!(calc.volume_ml, 200.9);
    }

    #[test]
    fn test_half_height_is_half_capacity() {
        for capacity in [330.0, 500.0, 750.0, 1000.0, 1500.0] {
            let calc = calculate_volume(280, 560, capacity, &LinearCurve).unwrap();
            assert_eq!(calc.percent, 50.0);
            assert_eq!(calc.volume_ml, round1(capacity / 2.0));
        }
    }

    #[test]
    fn test_invalid_capacity() {
        for capacity in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let err = calculate_volume(10, 100, capacity, &LinearCurve).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)));
        }
    }

    #[test]
    fn test_invalid_calibration_rejected_before_measuring() {
        let cal = VolumeCalibration {
            neck_fraction: 1.5,
            ..VolumeCalibration::STANDARD
        };
        let img = RgbImage::from_pixel(40, 80, image::Rgb([255, 255, 255]));
        let err = measure_liquid_volume(&img, 750.0, &cal, &LinearCurve).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)), "{:?}", err);

        let err = estimate_liquid_volume_with(b"not decoded", 750.0, &cal, &LinearCurve).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)), "{:?}", err);
    }

    #[test]
    fn test_piecewise_curve_interpolates() {
        // Shoulder: top 20% of height holds only 10% of volume
        let curve = PiecewiseLinearCurve::new(vec![(0.8, 0.9)]).unwrap();
        assert_eq!(curve.points().len(), 3);
        assert!((curve.volume_fraction(0.4) - 0.45).abs() < 1e-12);
        assert!((curve.volume_fraction(0.9) - 0.95).abs() < 1e-12);
        assert_eq!(curve.volume_fraction(1.5), 1.0);
        assert_eq!(curve.volume_fraction(-1.0), 0.0);

        let calc = calculate_volume(280, 560, 1000.0, &curve).unwrap();
        assert_eq!(calc.percent, 50.0);
        assert_eq!(calc.volume_ml, 562.5);
    }

    #[test]
    fn test_piecewise_curve_rejects_non_monotonic() {
        assert!(PiecewiseLinearCurve::new(vec![(0.5, 0.6), (0.4, 0.7)]).is_err());
        assert!(PiecewiseLinearCurve::new(vec![(0.5, 0.6), (0.6, 0.5)]).is_err());
        assert!(PiecewiseLinearCurve::new(vec![(1.2, 0.5)]).is_err());
    }
}
