//! Domain model types

pub mod reference;
pub mod waste;

pub use reference::ReferenceRecord;
pub use waste::WasteRecord;
