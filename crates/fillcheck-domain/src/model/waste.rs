use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One waste measurement appended to the waste log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
    pub id: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub dish_id: Option<String>,
    /// Kitchen zone the waste was attributed to, if any
    #[serde(default)]
    pub zone: Option<String>,
    pub wasted_weight: f64,
    pub consumed_weight: f64,
}

impl WasteRecord {
    pub fn new(wasted_weight: f64, consumed_weight: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            dish_id: None,
            zone: None,
            wasted_weight,
            consumed_weight,
        }
    }

    pub fn with_dish(mut self, dish_id: impl Into<String>) -> Self {
        self.dish_id = Some(dish_id.into());
        self
    }

    pub fn with_zone(mut self, zone: Option<String>) -> Self {
        self.zone = zone;
        self
    }

    pub fn at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }
}
