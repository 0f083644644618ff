//! Domain services

pub mod cost_projection;
pub mod waste_statistics;
pub mod weight_split;

pub use cost_projection::{project_costs, CostInputs, CostProjection, PeriodAmounts};
pub use waste_statistics::{summarize, time_series, zone_averages, WasteSummary};
pub use weight_split::{split_weight, WeightSplit};
