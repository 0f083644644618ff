//! Persistence implementations
//!
//! This module provides file-based and in-memory implementations of the
//! repository traits.

mod file_reference_repo;
mod file_waste_log;
mod memory_waste_log;

pub use file_reference_repo::{sha256_hex, FileReferenceRepository};
pub use file_waste_log::FileWasteLog;
pub use memory_waste_log::MemoryWasteLog;
