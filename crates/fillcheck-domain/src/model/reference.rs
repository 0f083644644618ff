use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered "full plate" photo of a dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub dish_id: String,
    pub name: String,
    /// Weight of a full serving
    pub full_weight: f64,
    /// Stored reference image file name, relative to the image directory
    pub reference_image: String,
    /// SHA-256 of the stored reference image
    pub image_sha256: String,
    pub registered_at: DateTime<Utc>,
}
