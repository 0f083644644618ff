//! Configuration management for fillcheck
//!
//! Config stored at: ~/.config/fillcheck/config.json

use fillcheck_types::{ConfigError, OutputFormat, Result, SimilarityStrategy};
use fillcheck_vision::{CalibrationProfile, DEFAULT_CAPACITY_ML};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::calibration::load_calibration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bottle capacity used when none is given on the command line
    #[serde(default = "default_capacity_ml")]
    pub default_capacity_ml: f64,

    /// Consumption strategy (fused, histogram)
    #[serde(default)]
    pub similarity_strategy: SimilarityStrategy,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Store directory override (dish registry, waste log)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// TOML file overriding calibration constants
    #[serde(default)]
    pub calibration_file: Option<PathBuf>,

    /// Images with a longer side are rejected before analysis
    #[serde(default = "default_max_image_side")]
    pub max_image_side: u32,

    /// JPEG quality for stored reference photos and annotated output
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_capacity_ml() -> f64 {
    DEFAULT_CAPACITY_ML
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_max_image_side() -> u32 {
    4096
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_capacity_ml: default_capacity_ml(),
            similarity_strategy: SimilarityStrategy::default(),
            output_format: default_output_format(),
            store_dir: None,
            calibration_file: None,
            max_image_side: default_max_image_side(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("fillcheck");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("fillcheck");
        Ok(store_dir)
    }

    /// Calibration profile: the standard one, or the TOML overrides if configured
    pub fn calibration(&self) -> Result<CalibrationProfile> {
        load_calibration(self.calibration_file.as_deref())
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fillcheck Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Default capacity:  {} mL", self.default_capacity_ml)?;
        writeln!(f, "Strategy:          {}", self.similarity_strategy)?;
        writeln!(f, "Output format:     {}", self.output_format)?;
        writeln!(
            f,
            "Store dir:         {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(
            f,
            "Calibration file:  {}",
            self.calibration_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(standard)".to_string())
        )?;
        writeln!(f, "Max image side:    {} px", self.max_image_side)?;
        writeln!(f, "JPEG quality:      {}", self.jpeg_quality)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:       {}", path.display())?;
        }

        Ok(())
    }
}
