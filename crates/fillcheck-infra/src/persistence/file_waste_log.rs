//! Waste log persisted as a JSON array

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fillcheck_domain::model::WasteRecord;
use fillcheck_domain::repository::WasteSink;
use fillcheck_types::Result;

/// File-backed WasteSink; every append rewrites the file
pub struct FileWasteLog {
    path: PathBuf,
    records: Mutex<Vec<WasteRecord>>,
}

impl FileWasteLog {
    pub const FILE_NAME: &'static str = "waste_log.json";

    /// Open `<store_dir>/waste_log.json`, creating the directory if needed
    pub fn open(store_dir: &Path) -> Result<Self> {
        fs::create_dir_all(store_dir)?;
        let path = store_dir.join(Self::FILE_NAME);
        let records = if path.exists() {
            serde_json::from_reader(BufReader::new(File::open(&path)?))?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[WasteRecord]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}

impl WasteSink for FileWasteLog {
    fn append(&self, record: &WasteRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(record.clone());
        if let Err(e) = self.persist(&records) {
            records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn records(&self) -> Result<Vec<WasteRecord>> {
        Ok(self.records.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn clear(&self) -> Result<usize> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        self.persist(&[])?;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}
