//! Repository adapters for persistence layer

use fillcheck_infra::persistence::{FileReferenceRepository, FileWasteLog};
use fillcheck_types::Result;

use crate::config::Config;

/// Open the file-based dish registry in the configured store
pub fn open_reference_repo(config: &Config) -> Result<FileReferenceRepository> {
    let store_dir = config.store_dir()?;
    FileReferenceRepository::open(&store_dir)
}

/// Open the file-based waste log in the configured store
pub fn open_waste_log(config: &Config) -> Result<FileWasteLog> {
    let store_dir = config.store_dir()?;
    FileWasteLog::open(&store_dir)
}
