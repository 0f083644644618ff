//! Repository trait definitions for data persistence

use crate::model::{ReferenceRecord, WasteRecord};
use fillcheck_types::Error;

/// Registry of reference ("full plate") dishes
pub trait ReferenceRepository {
    /// Register a dish; `jpeg_image` is stored as the reference photo
    fn add(&self, name: &str, full_weight: f64, jpeg_image: &[u8]) -> Result<ReferenceRecord, Error>;

    /// Look up a dish by id
    fn get(&self, dish_id: &str) -> Result<Option<ReferenceRecord>, Error>;

    /// All registered dishes, ordered by id
    fn find_all(&self) -> Result<Vec<ReferenceRecord>, Error>;

    /// Raw bytes of the stored reference image
    fn load_image(&self, record: &ReferenceRecord) -> Result<Vec<u8>, Error>;
}

/// Append-only sink for waste measurements.
///
/// Implementations own their synchronization; the estimators never touch it.
pub trait WasteSink: Send + Sync {
    fn append(&self, record: &WasteRecord) -> Result<(), Error>;

    /// All records in append order
    fn records(&self) -> Result<Vec<WasteRecord>, Error>;

    /// Drop every record, returning how many were removed
    fn clear(&self) -> Result<usize, Error>;
}
