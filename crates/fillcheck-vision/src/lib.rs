//! Deterministic visual quantity estimation.
//!
//! Two estimators share one pipeline shape (normalize, segment, extract
//! features, fuse, calibrate) and one read-only [`CalibrationProfile`]:
//!
//! - [`estimate_liquid_volume`]: remaining liquid in a photographed bottle
//! - [`estimate_consumption`]: share of a plate eaten, against a reference photo
//!
//! [`analyze_kitchen`] scores user-drawn kitchen stations on a blurred
//! intensity heatmap of a single photo.
//!
//! Every call is a pure function of its inputs. Nothing here does I/O or holds
//! shared mutable state, so calls can run on any number of threads.

pub mod annotate;
pub mod calibration;
pub mod color;
pub mod consumption;
pub mod liquid;
pub mod normalize;
pub mod scanline;
pub mod segment;
pub mod volume;
pub mod zones;

pub use calibration::{
    CalibrationProfile, ConsumptionCalibration, FusionWeights, VolumeCalibration,
    DEFAULT_CAPACITY_ML, NECK_FRACTION, RATIO_MAX, RATIO_MIN,
};
pub use consumption::{
    estimate_consumption, estimate_consumption_with, score_consumption, ConsumptionReport,
    ScoreBreakdown,
};
pub use normalize::{decode, encode_jpeg, encode_png, normalize, normalize_square};
pub use volume::{
    calculate_volume, estimate_liquid_volume, estimate_liquid_volume_with, measure_liquid_volume,
    LinearCurve, LiquidVolumeReport, PiecewiseLinearCurve, VolumeCalculation, VolumeCurve,
};
pub use zones::{analyze_kitchen, KitchenReport, KitchenZone, ZoneRect, ZoneScore};
