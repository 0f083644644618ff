use std::sync::Mutex;

use fillcheck_domain::model::WasteRecord;
use fillcheck_domain::repository::WasteSink;
use fillcheck_types::Result;

/// In-process WasteSink, lost on exit
#[derive(Default)]
pub struct MemoryWasteLog {
    records: Mutex<Vec<WasteRecord>>,
}

impl MemoryWasteLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WasteSink for MemoryWasteLog {
    fn append(&self, record: &WasteRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<WasteRecord>> {
        Ok(self.records.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn clear(&self) -> Result<usize> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_clear() {
        let log = MemoryWasteLog::new();
        log.append(&WasteRecord::new(10.0, 90.0)).unwrap();
        log.append(&WasteRecord::new(20.0, 80.0)).unwrap();
        assert_eq!(log.records().unwrap().len(), 2);
        assert_eq!(log.clear().unwrap(), 2);
        assert!(log.records().unwrap().is_empty());
    }
}
