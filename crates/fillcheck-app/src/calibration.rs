//! Loading calibration overrides from TOML

use std::path::Path;

use fillcheck_types::{ConfigError, Result};
use fillcheck_vision::CalibrationProfile;
use log::info;

/// Standard profile, or the standard profile overlaid with the fields set in
/// `path`. The result is validated before it is returned.
pub fn load_calibration(path: Option<&Path>) -> Result<CalibrationProfile> {
    let Some(path) = path else {
        return Ok(CalibrationProfile::standard().clone());
    };

    let content = std::fs::read_to_string(path)?;
    let profile = parse_calibration(&content)?;
    info!("Loaded calibration overrides from {}", path.display());
    Ok(profile)
}

pub fn parse_calibration(content: &str) -> Result<CalibrationProfile> {
    let profile: CalibrationProfile = toml::from_str(content)?;
    profile
        .validate()
        .map_err(|e| ConfigError::InvalidCalibration(e.to_string()))?;
    Ok(profile)
}
