//! Plate consumption estimation against a reference "full plate" photo.
//!
//! Both strategies go through [`score_consumption`] and share one
//! [`ConsumptionCalibration`], so switching strategy never changes the spread
//! or clamp policy.

mod features;
mod ssim;

pub use features::{
    brightness_gain, channel_histograms, food_area, food_mask, histogram_intersection,
    histogram_similarity, mask_fraction, mean_brightness, normalized_mse, FoodArea,
};
pub use ssim::structural_similarity;

use fillcheck_domain::service::split_weight;
use fillcheck_types::{
    ConsumptionEstimate, Error, FeatureVector, ImageRole, Result, SimilarityStrategy,
};
use image::RgbImage;
use log::debug;

use crate::annotate::annotate_consumption;
use crate::calibration::{CalibrationProfile, ConsumptionCalibration};
use crate::color::to_gray;
use crate::normalize::{normalize_square, resize_square};

/// Raw and calibrated consumption score with the signals behind it
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    /// Weighted score before spread and clamp
    pub raw_score: f64,
    /// Consumed fraction in `[ratio_min, ratio_max]`
    pub ratio: f64,
    pub features: FeatureVector,
    pub used_fallback: bool,
}

/// Score how much of the reference plate has been eaten.
///
/// Images are resized to the calibration input size if they are not already.
/// Every signal is oriented so that a higher value means more consumed.
pub fn score_consumption(
    current: &RgbImage,
    reference: &RgbImage,
    strategy: SimilarityStrategy,
    calibration: &ConsumptionCalibration,
) -> Result<ScoreBreakdown> {
    calibration.validate()?;
    let size = calibration.input_size;
    let current = resize_square(current.clone(), size);
    let reference = resize_square(reference.clone(), size);

    let hist = histogram_similarity(&current, &reference, calibration.histogram_bins);
    let mut features = FeatureVector::new();
    features.insert("hist_similarity", hist);

    let (raw_score, used_fallback) = match strategy {
        SimilarityStrategy::HistogramOnly => (1.0 - hist, false),
        SimilarityStrategy::Fused => {
            let current_gray = to_gray(&current);
            let reference_gray = to_gray(&reference);

            let ssim = structural_similarity(
                &current_gray,
                &reference_gray,
                calibration.ssim_window,
                calibration.ssim_k1,
                calibration.ssim_k2,
            )?;
            let nmse = normalized_mse(&current_gray, &reference_gray);
            let brightness = brightness_gain(&current, &reference);

            let cutoff = calibration.background_cutoff;
            let area = food_area(
                mask_fraction(&food_mask(&current_gray, cutoff)),
                mask_fraction(&food_mask(&reference_gray, cutoff)),
                calibration.food_area_min,
                calibration.food_area_max,
            );

            features.insert("ssim_score", ssim);
            features.insert("normalized_mse", nmse);
            features.insert("brightness_diff", brightness);
            features.insert("food_area_ratio", area.ratio);
            features.insert("current_food_fraction", area.current_fraction);
            features.insert("reference_food_fraction", area.reference_fraction);
            features.insert_flag("food_area_clamped", area.clamped);

            let w = &calibration.weights;
            let score = w.histogram * (1.0 - hist)
                + w.ssim * (1.0 - ssim)
                + w.mse * (1.0 - nmse)
                + w.brightness * brightness
                + w.food_area * (1.0 - area.ratio);
            (score, area.clamped)
        }
    };

    let ratio = calibration.spread_and_clamp(raw_score, strategy);
    features.insert("raw_score", raw_score);
    features.insert("consumption_ratio", ratio);
    features.insert_flag("used_fallback", used_fallback);

    debug!(
        "consumption ({}): raw score {:.4} -> ratio {:.4}",
        strategy, raw_score, ratio
    );

    Ok(ScoreBreakdown {
        raw_score,
        ratio,
        features,
        used_fallback,
    })
}

/// Estimate plus the side-by-side annotated frame
#[derive(Debug, Clone)]
pub struct ConsumptionReport {
    pub estimate: ConsumptionEstimate,
    pub annotated: RgbImage,
}

/// Fused estimate with the standard calibration
pub fn estimate_consumption(
    current: &[u8],
    reference: &[u8],
    full_weight: f64,
) -> Result<ConsumptionReport> {
    estimate_consumption_with(
        current,
        reference,
        full_weight,
        SimilarityStrategy::Fused,
        &CalibrationProfile::standard().consumption,
    )
}

pub fn estimate_consumption_with(
    current: &[u8],
    reference: &[u8],
    full_weight: f64,
    strategy: SimilarityStrategy,
    calibration: &ConsumptionCalibration,
) -> Result<ConsumptionReport> {
    if !(full_weight.is_finite() && full_weight > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "full weight must be positive, got {}",
            full_weight
        )));
    }
    calibration.validate()?;

    let size = calibration.input_size;
    let current = normalize_square(current, ImageRole::Current, size)?;
    let reference = normalize_square(reference, ImageRole::Reference, size)?;

    let score = score_consumption(&current, &reference, strategy, calibration)?;
    let split = split_weight(full_weight, score.ratio);

    let cutoff = calibration.background_cutoff;
    let annotated = annotate_consumption(
        &current,
        &reference,
        &food_mask(&to_gray(&current), cutoff),
        &food_mask(&to_gray(&reference), cutoff),
    );

    Ok(ConsumptionReport {
        estimate: ConsumptionEstimate {
            strategy,
            full_weight,
            consumption_ratio: score.ratio,
            consumed_weight: split.consumed_weight,
            wasted_weight: split.wasted_weight,
            consumed_percent: split.consumed_percent,
            wasted_percent: split.wasted_percent,
            used_fallback: score.used_fallback,
            diagnostics: score.features,
        },
        annotated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const CAL: ConsumptionCalibration = ConsumptionCalibration::STANDARD;

    fn full_plate() -> RgbImage {
        RgbImage::from_fn(224, 224, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([90, 40, 10])
            } else {
                Rgb([10, 20, 5])
            }
        })
    }

    fn empty_plate() -> RgbImage {
        RgbImage::from_pixel(224, 224, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_identical_plates_hit_lower_clamp() {
        let plate = full_plate();
        for strategy in [SimilarityStrategy::Fused, SimilarityStrategy::HistogramOnly] {
            let score = score_consumption(&plate, &plate, strategy, &CAL).unwrap();
            assert_eq!(score.ratio, CAL.ratio_min, "{}", strategy);
            assert!(score.raw_score < 1e-9);
        }
    }

    #[test]
    fn test_emptied_plate_hits_upper_clamp() {
        let score =
            score_consumption(&empty_plate(), &full_plate(), SimilarityStrategy::Fused, &CAL)
                .unwrap();
        assert_eq!(score.ratio, CAL.ratio_max);
        // No food left: the food-area ratio is clamped up to its floor
        assert_eq!(score.features.get("food_area_ratio"), Some(0.1));
        assert!(score.used_fallback);
        assert_eq!(score.features.get("hist_similarity"), Some(0.0));
    }

    #[test]
    fn test_fused_diagnostics_keys() {
        let score =
            score_consumption(&full_plate(), &full_plate(), SimilarityStrategy::Fused, &CAL)
                .unwrap();
        for key in [
            "hist_similarity",
            "ssim_score",
            "normalized_mse",
            "brightness_diff",
            "food_area_ratio",
            "raw_score",
            "consumption_ratio",
            "used_fallback",
        ] {
            assert!(score.features.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_histogram_strategy_is_single_signal() {
        let score = score_consumption(
            &empty_plate(),
            &full_plate(),
            SimilarityStrategy::HistogramOnly,
            &CAL,
        )
        .unwrap();
        assert_eq!(score.raw_score, 1.0);
        assert_eq!(score.ratio, CAL.ratio_max);
        assert!(score.features.get("ssim_score").is_none());
    }

    #[test]
    fn test_degenerate_ssim_window_rejected() {
        let cal = ConsumptionCalibration {
            ssim_window: 1,
            ..ConsumptionCalibration::STANDARD
        };
        let plate = full_plate();
        let err = score_consumption(&plate, &plate, SimilarityStrategy::Fused, &cal).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err = estimate_consumption_with(b"x", b"y", 300.0, SimilarityStrategy::Fused, &cal)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        for weight in [0.0, -5.0, f64::NAN] {
            let err = estimate_consumption(b"ignored", b"ignored", weight).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)));
        }
    }
}
