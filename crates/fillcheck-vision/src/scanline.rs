//! Horizontal scanline projection of the liquid mask

use fillcheck_types::{Error, LiquidBand, Result};
use image::GrayImage;

use crate::calibration::VolumeCalibration;

/// Count of non-zero mask pixels per row
pub fn row_projection(mask: &GrayImage) -> Vec<u32> {
    mask.rows()
        .map(|row| row.filter(|px| px[0] > 0).count() as u32)
        .collect()
}

/// Minimum pixel count for a row to count as liquid
pub fn row_threshold(width: u32, calibration: &VolumeCalibration) -> f64 {
    (width as f64 * calibration.row_fraction).max(calibration.row_min_pixels)
}

/// Find the contiguous liquid band above the lowest liquid row.
///
/// `bottom` is the lowest row over the threshold. Scanning upward from there,
/// `top` is one past the first row under the threshold, or 0 if the band
/// reaches the top of the region.
pub fn detect_liquid_band(
    projection: &[u32],
    width: u32,
    calibration: &VolumeCalibration,
) -> Result<LiquidBand> {
    let threshold = row_threshold(width, calibration);

    let bottom = projection
        .iter()
        .rposition(|&count| count as f64 > threshold)
        .ok_or_else(|| {
            Error::LiquidLevelUndetectable(format!(
                "no row exceeds {:.1} liquid pixels",
                threshold
            ))
        })?;

    let top = (0..bottom)
        .rev()
        .find(|&i| (projection[i] as f64) < threshold)
        .map_or(0, |i| i + 1);

    let height = bottom - top;
    if (height as u32) < calibration.min_band_height_px {
        return Err(Error::LiquidLevelUndetectable(format!(
            "liquid band rows {}..{} is only {} px high",
            top, bottom, height
        )));
    }

    Ok(LiquidBand {
        top: top as u32,
        bottom: bottom as u32,
    })
}
