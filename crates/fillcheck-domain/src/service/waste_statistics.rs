//! Aggregations over the waste log

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::WasteRecord;

/// Bucket key format for time series (one bucket per minute)
pub const TIME_BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteSummary {
    pub total: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

/// Summary statistics of wasted weight; `None` when there are no records
pub fn summarize(records: &[WasteRecord]) -> Option<WasteSummary> {
    if records.is_empty() {
        return None;
    }

    let total: f64 = records.iter().map(|r| r.wasted_weight).sum();
    let max = records
        .iter()
        .map(|r| r.wasted_weight)
        .fold(f64::NEG_INFINITY, f64::max);
    let min = records
        .iter()
        .map(|r| r.wasted_weight)
        .fold(f64::INFINITY, f64::min);

    Some(WasteSummary {
        total,
        average: total / records.len() as f64,
        max,
        min,
        count: records.len(),
    })
}

/// Wasted weight summed per minute bucket, oldest first
pub fn time_series(records: &[WasteRecord]) -> Vec<(String, f64)> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        let key = r.recorded_at.format(TIME_BUCKET_FORMAT).to_string();
        *buckets.entry(key).or_insert(0.0) += r.wasted_weight;
    }
    buckets.into_iter().collect()
}

/// Mean wasted weight per zone; records without a zone are skipped
pub fn zone_averages(records: &[WasteRecord]) -> BTreeMap<String, f64> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for r in records {
        if let Some(ref zone) = r.zone {
            let entry = acc.entry(zone.clone()).or_insert((0.0, 0));
            entry.0 += r.wasted_weight;
            entry.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(zone, (sum, n))| (zone, sum / n as f64))
        .collect()
}
