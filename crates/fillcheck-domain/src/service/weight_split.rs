//! Splitting a serving weight into consumed and wasted parts

use serde::{Deserialize, Serialize};

/// Consumed / wasted breakdown of a full serving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSplit {
    pub consumed_weight: f64,
    pub wasted_weight: f64,
    pub consumed_percent: f64,
    pub wasted_percent: f64,
}

/// Split `full_weight` by a consumption ratio.
///
/// # Formula
/// consumed = full_weight x ratio, wasted = full_weight - consumed
///
/// The wasted part is derived by subtraction so `consumed + wasted` always
/// reproduces `full_weight`. Callers validate `full_weight > 0`.
pub fn split_weight(full_weight: f64, consumption_ratio: f64) -> WeightSplit {
    let consumed_weight = full_weight * consumption_ratio;
    let wasted_weight = full_weight - consumed_weight;

    WeightSplit {
        consumed_weight,
        wasted_weight,
        consumed_percent: consumed_weight / full_weight * 100.0,
        wasted_percent: wasted_weight / full_weight * 100.0,
    }
}
