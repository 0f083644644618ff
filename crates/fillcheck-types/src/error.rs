//! Error types for fillcheck

use thiserror::Error;

use crate::types::{ImageRole, Stage};

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid calibration profile: {0}")]
    InvalidCalibration(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to decode {input} image: {message}")]
    Decode { input: ImageRole, message: String },

    #[error("No bottle detected: {0}")]
    NoBottleDetected(String),

    #[error("Unable to detect liquid level reliably: {0}")]
    LiquidLevelUndetectable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dish not found with ID: {0}")]
    ReferenceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Excel export error: {0}")]
    Excel(String),
}

impl Error {
    /// Pipeline stage that produced this error, if it came from the estimation core
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Decode { .. } => Some(Stage::Decode),
            Error::NoBottleDetected(_) => Some(Stage::Segmentation),
            Error::LiquidLevelUndetectable(_) => Some(Stage::Scanline),
            Error::InvalidParameter(_) => Some(Stage::Calibration),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_input() {
        let err = Error::Decode {
            input: ImageRole::Reference,
            message: "bad magic".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to decode reference image: bad magic");
        assert_eq!(err.stage(), Some(Stage::Decode));
    }

    #[test]
    fn test_stage_mapping() {
        assert_eq!(
            Error::NoBottleDetected("no contours".into()).stage(),
            Some(Stage::Segmentation)
        );
        assert_eq!(
            Error::LiquidLevelUndetectable("band too thin".into()).stage(),
            Some(Stage::Scanline)
        );
        assert_eq!(Error::FileNotFound("x.jpg".into()).stage(), None);
    }
}
