//! Application Layer
//!
//! This module orchestrates between the CLI and the vision, domain and
//! infrastructure layers.

pub mod analysis_service;

pub use analysis_service::{
    AnalysisService, AnalysisServiceError, DishAnalysis, KitchenAnalysis, WasteReport,
};
