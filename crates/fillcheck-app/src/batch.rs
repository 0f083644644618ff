//! Parallel liquid volume runs over a set of bottle photos

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use chrono::{DateTime, Utc};
use fillcheck_types::{Error, ImageRole, Result, VolumeEstimate};
use fillcheck_vision::{measure_liquid_volume, normalize, LinearCurve, VolumeCalibration};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::scanner::read_image;

/// One successfully measured photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchVolumeEntry {
    pub image_path: String,
    pub estimate: VolumeEstimate,
}

/// One photo that could not be measured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub image_path: String,
    /// Pipeline stage that failed, if the error came from the estimator
    pub stage: Option<String>,
    pub error: String,
}

/// Batch run results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchVolumeResults {
    pub entries: Vec<BatchVolumeEntry>,
    #[serde(default)]
    pub failures: Vec<BatchFailure>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub capacity_ml: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BatchVolumeResults {
    /// Read results previously written as JSON
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Mean remaining volume over successful entries
    pub fn average_volume_ml(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|e| e.estimate.volume_ml).sum();
        Some(sum / self.entries.len() as f64)
    }
}

/// Batch run options
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub capacity_ml: f64,
    /// Worker threads; at least one is always used
    pub jobs: usize,
    pub max_image_side: u32,
    pub calibration: VolumeCalibration,
}

/// Measure a single photo from disk
pub fn measure_file(path: &Path, options: &BatchOptions) -> Result<VolumeEstimate> {
    let bytes = read_image(path, options.max_image_side)?;
    let image = normalize(&bytes, ImageRole::Bottle)?;
    let report = measure_liquid_volume(
        &image,
        options.capacity_ml,
        &options.calibration,
        &LinearCurve,
    )?;
    Ok(report.estimate)
}

/// Measure every image on `options.jobs` worker threads.
///
/// `on_progress` is called once per finished image, from the worker thread
/// that processed it. Results are ordered by input position.
pub fn run_volume_batch<F>(
    images: &[PathBuf],
    options: &BatchOptions,
    on_progress: F,
) -> BatchVolumeResults
where
    F: Fn(&Path) + Sync,
{
    let started_at = Utc::now();
    let next_index = AtomicUsize::new(0);
    let results: Mutex<Vec<(usize, Result<VolumeEstimate>)>> =
        Mutex::new(Vec::with_capacity(images.len()));
    let jobs = options.jobs.clamp(1, images.len().max(1));

    thread::scope(|scope| {
        for worker_id in 0..jobs {
            let next_index = &next_index;
            let results = &results;
            let on_progress = &on_progress;

            scope.spawn(move || loop {
                let idx = next_index.fetch_add(1, Ordering::SeqCst);
                if idx >= images.len() {
                    break;
                }

                let image = &images[idx];
                debug!("[W{}] measuring {}", worker_id, image.display());
                let result = measure_file(image, options);
                if let Err(ref e) = result {
                    warn!("{}: {}", image.display(), e);
                }

                results
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((idx, result));
                on_progress(image.as_path());
            });
        }
    });

    let mut collected = results.into_inner().unwrap_or_else(|e| e.into_inner());
    collected.sort_by_key(|(idx, _)| *idx);

    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for (idx, result) in collected {
        let image_path = images[idx].display().to_string();
        match result {
            Ok(estimate) => entries.push(BatchVolumeEntry { image_path, estimate }),
            Err(e) => failures.push(BatchFailure {
                image_path,
                stage: e.stage().map(|s| s.label().to_string()),
                error: e.to_string(),
            }),
        }
    }

    BatchVolumeResults {
        total: images.len(),
        successful: entries.len(),
        failed: failures.len(),
        entries,
        failures,
        capacity_ml: options.capacity_ml,
        started_at,
        completed_at: Utc::now(),
    }
}
