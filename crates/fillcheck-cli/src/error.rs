//! Error type for command handlers

use fillcheck_app::app::AnalysisServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fillcheck_types::Error),

    #[error(transparent)]
    Service(#[from] AnalysisServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
