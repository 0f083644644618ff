//! Analysis Service - use cases for bottle and plate photos
//!
//! The service owns the calibration profile and the collaborators the
//! estimators must not touch themselves:
//! 1. Validate and read input images (size-bounded)
//! 2. Run the estimator from `fillcheck-vision`
//! 3. Look up reference dishes and record waste measurements

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use fillcheck_domain::model::{ReferenceRecord, WasteRecord};
use fillcheck_domain::repository::{ReferenceRepository, WasteSink};
use fillcheck_domain::service::{summarize, time_series, zone_averages, WasteSummary};
use fillcheck_types::{Error, ImageRole, SimilarityStrategy};
use fillcheck_vision::{
    analyze_kitchen, encode_jpeg, estimate_consumption_with, measure_liquid_volume, normalize,
    CalibrationProfile, ConsumptionReport, KitchenReport, KitchenZone, LinearCurve,
    LiquidVolumeReport, VolumeCurve,
};
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::repository::{open_reference_repo, open_waste_log};
use crate::scanner::read_image;

/// Errors specific to the analysis service
#[derive(Debug, Error)]
pub enum AnalysisServiceError {
    #[error("Image validation failed: {0}")]
    InvalidImage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{stage} failed: {message}")]
    Estimation { stage: &'static str, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}

impl From<Error> for AnalysisServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidParameter(msg) => AnalysisServiceError::InvalidParameter(msg),
            Error::FileNotFound(msg) | Error::InvalidImageFormat(msg) => {
                AnalysisServiceError::InvalidImage(msg)
            }
            Error::ReferenceNotFound(_) => AnalysisServiceError::NotFound(err.to_string()),
            Error::Config(e) => AnalysisServiceError::ConfigError(e.to_string()),
            Error::Toml(e) => AnalysisServiceError::ConfigError(e.to_string()),
            Error::Io(e) => AnalysisServiceError::StoreError(e.to_string()),
            Error::Json(e) => AnalysisServiceError::StoreError(e.to_string()),
            _ => match err.stage() {
                Some(stage) => AnalysisServiceError::Estimation {
                    stage: stage.label(),
                    message: err.to_string(),
                },
                None => AnalysisServiceError::AnalysisFailed(err.to_string()),
            },
        }
    }
}

type ServiceResult<T> = std::result::Result<T, AnalysisServiceError>;

/// Outcome of analyzing a plate against a registered dish
#[derive(Debug, Clone)]
pub struct DishAnalysis {
    pub dish: ReferenceRecord,
    pub report: ConsumptionReport,
    /// Record appended to the waste log
    pub record: WasteRecord,
}

/// Outcome of scoring kitchen zones on one photo
#[derive(Debug, Clone, Serialize)]
pub struct KitchenAnalysis {
    pub report: KitchenReport,
    /// One record per zone, in request order
    pub records: Vec<WasteRecord>,
}

/// Aggregates over the waste log
#[derive(Debug, Clone, Serialize)]
pub struct WasteReport {
    pub summary: Option<WasteSummary>,
    /// Per-minute totals, oldest first
    pub time_series: Vec<(String, f64)>,
    pub zone_averages: BTreeMap<String, f64>,
}

pub struct AnalysisService {
    profile: CalibrationProfile,
    strategy: SimilarityStrategy,
    max_image_side: u32,
    jpeg_quality: u8,
    curve: Box<dyn VolumeCurve>,
    references: Box<dyn ReferenceRepository>,
    waste: Arc<dyn WasteSink>,
}

impl AnalysisService {
    /// Service with the standard profile, linear volume curve and default limits
    pub fn new(references: Box<dyn ReferenceRepository>, waste: Arc<dyn WasteSink>) -> Self {
        let defaults = Config::default();
        Self {
            profile: CalibrationProfile::standard().clone(),
            strategy: defaults.similarity_strategy,
            max_image_side: defaults.max_image_side,
            jpeg_quality: defaults.jpeg_quality,
            curve: Box::new(LinearCurve),
            references,
            waste,
        }
    }

    /// Service backed by the configured file store and calibration
    pub fn from_config(config: &Config) -> ServiceResult<Self> {
        let references = open_reference_repo(config)?;
        let waste = open_waste_log(config)?;
        Ok(Self::new(Box::new(references), Arc::new(waste))
            .with_profile(config.calibration()?)
            .with_strategy(config.similarity_strategy)
            .with_limits(config.max_image_side, config.jpeg_quality))
    }

    pub fn with_profile(mut self, profile: CalibrationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_strategy(mut self, strategy: SimilarityStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_limits(mut self, max_image_side: u32, jpeg_quality: u8) -> Self {
        self.max_image_side = max_image_side;
        self.jpeg_quality = jpeg_quality;
        self
    }

    pub fn with_curve(mut self, curve: Box<dyn VolumeCurve>) -> Self {
        self.curve = curve;
        self
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    pub fn strategy(&self) -> SimilarityStrategy {
        self.strategy
    }

    /// Remaining liquid in the bottle photographed at `image_path`
    pub fn measure_bottle(
        &self,
        image_path: &Path,
        capacity_ml: f64,
    ) -> ServiceResult<LiquidVolumeReport> {
        let bytes = read_image(image_path, self.max_image_side)?;
        let image = normalize(&bytes, ImageRole::Bottle)?;
        let report = measure_liquid_volume(
            &image,
            capacity_ml,
            &self.profile.volume,
            self.curve.as_ref(),
        )?;
        info!(
            "{}: {}% / {} mL",
            image_path.display(),
            report.estimate.percent,
            report.estimate.volume_ml
        );
        Ok(report)
    }

    /// Compare two plate photos directly, without touching the registry or waste log
    pub fn compare(
        &self,
        current_path: &Path,
        reference_path: &Path,
        full_weight: f64,
    ) -> ServiceResult<ConsumptionReport> {
        let current = read_image(current_path, self.max_image_side)?;
        let reference = read_image(reference_path, self.max_image_side)?;
        Ok(estimate_consumption_with(
            &current,
            &reference,
            full_weight,
            self.strategy,
            &self.profile.consumption,
        )?)
    }

    /// Register a dish; the photo is stored re-encoded as RGB JPEG
    pub fn register_dish(
        &self,
        name: &str,
        full_weight: f64,
        image_path: &Path,
    ) -> ServiceResult<ReferenceRecord> {
        let bytes = read_image(image_path, self.max_image_side)?;
        let image = normalize(&bytes, ImageRole::Reference)?;
        let jpeg = encode_jpeg(&image, self.jpeg_quality)?;
        Ok(self.references.add(name, full_weight, &jpeg)?)
    }

    pub fn list_dishes(&self) -> ServiceResult<Vec<ReferenceRecord>> {
        Ok(self.references.find_all()?)
    }

    /// Estimate consumption against a registered dish and log the waste
    pub fn analyze_dish(
        &self,
        dish_id: &str,
        current_path: &Path,
        zone: Option<String>,
    ) -> ServiceResult<DishAnalysis> {
        let dish = self
            .references
            .get(dish_id)?
            .ok_or_else(|| Error::ReferenceNotFound(dish_id.to_string()))?;

        let current = read_image(current_path, self.max_image_side)?;
        let reference = self.references.load_image(&dish)?;
        let report = estimate_consumption_with(
            &current,
            &reference,
            dish.full_weight,
            self.strategy,
            &self.profile.consumption,
        )?;

        let estimate = &report.estimate;
        let record = WasteRecord::new(estimate.wasted_weight, estimate.consumed_weight)
            .with_dish(dish.dish_id.clone())
            .with_zone(zone);
        self.waste.append(&record)?;

        info!(
            "Dish {} ({}): {:.1}% consumed, {:.1} wasted",
            dish.dish_id, dish.name, estimate.consumed_percent, estimate.wasted_weight
        );

        Ok(DishAnalysis { dish, report, record })
    }

    /// Score each zone of a kitchen photo and log one waste record per zone
    pub fn analyze_kitchen_zones(
        &self,
        image_path: &Path,
        zones: &[KitchenZone],
    ) -> ServiceResult<KitchenAnalysis> {
        if zones.is_empty() {
            return Err(AnalysisServiceError::InvalidParameter(
                "at least one zone is required".to_string(),
            ));
        }

        let bytes = read_image(image_path, self.max_image_side)?;
        let image = normalize(&bytes, ImageRole::Kitchen)?;
        let report = analyze_kitchen(&image, zones)?;

        let mut records = Vec::with_capacity(report.zones.len());
        for zone in &report.zones {
            let record = WasteRecord::new(zone.score, 0.0).with_zone(Some(zone.zone.clone()));
            self.waste.append(&record)?;
            records.push(record);
        }

        info!(
            "{}: {} zones, total waste score {:.3}",
            image_path.display(),
            report.zones.len(),
            report.total
        );
        Ok(KitchenAnalysis { report, records })
    }

    pub fn statistics(&self) -> ServiceResult<WasteReport> {
        let records = self.waste.records()?;
        Ok(WasteReport {
            summary: summarize(&records),
            time_series: time_series(&records),
            zone_averages: zone_averages(&records),
        })
    }

    /// Clear the waste log, returning the number of removed records
    pub fn reset_statistics(&self) -> ServiceResult<usize> {
        let removed = self.waste.clear()?;
        info!("Cleared {} waste records", removed);
        Ok(removed)
    }
}
