//! File-based reference dish registry
//!
//! Records live in `<store>/dish_database.json`, reference photos in
//! `<store>/reference_images/`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use log::{info, warn};
use sha2::{Digest, Sha256};

use fillcheck_domain::model::ReferenceRecord;
use fillcheck_domain::repository::ReferenceRepository;
use fillcheck_types::{Error, Result};

const DATABASE_FILE: &str = "dish_database.json";
const IMAGE_DIR: &str = "reference_images";

/// JSON-backed implementation of ReferenceRepository
pub struct FileReferenceRepository {
    db_path: PathBuf,
    image_dir: PathBuf,
    records: RwLock<BTreeMap<String, ReferenceRecord>>,
}

impl FileReferenceRepository {
    /// Create or load the registry under `store_dir`
    pub fn open(store_dir: &Path) -> Result<Self> {
        let image_dir = store_dir.join(IMAGE_DIR);
        fs::create_dir_all(&image_dir)?;
        let db_path = store_dir.join(DATABASE_FILE);

        let records = if db_path.exists() {
            let reader = BufReader::new(File::open(&db_path)?);
            serde_json::from_reader(reader)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            db_path,
            image_dir,
            records: RwLock::new(records),
        })
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    fn persist(&self, records: &BTreeMap<String, ReferenceRecord>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.db_path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}

/// Next sequential id: one past the largest numeric id
fn next_id(records: &BTreeMap<String, ReferenceRecord>) -> String {
    let max = records
        .keys()
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

/// Dish name reduced to alphanumerics, spaces and underscores
fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let stem = stem.trim_end();
    if stem.is_empty() {
        "dish".to_string()
    } else {
        stem.to_string()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl ReferenceRepository for FileReferenceRepository {
    fn add(&self, name: &str, full_weight: f64, jpeg_image: &[u8]) -> Result<ReferenceRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidParameter("dish name must not be empty".to_string()));
        }
        if !(full_weight.is_finite() && full_weight > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "full weight must be positive, got {}",
                full_weight
            )));
        }

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let dish_id = next_id(&records);
        let file_name = format!("{}_{}.jpg", safe_file_stem(name), dish_id);
        let image_path = self.image_dir.join(&file_name);
        fs::write(&image_path, jpeg_image)?;

        let record = ReferenceRecord {
            dish_id: dish_id.clone(),
            name: name.to_string(),
            full_weight,
            reference_image: file_name,
            image_sha256: sha256_hex(jpeg_image),
            registered_at: Utc::now(),
        };
        records.insert(dish_id.clone(), record.clone());
        if let Err(e) = self.persist(&records) {
            records.remove(&dish_id);
            if let Err(rm) = fs::remove_file(&image_path) {
                warn!("Could not remove {}: {}", image_path.display(), rm);
            }
            return Err(e);
        }

        info!("Registered dish {} ({}, {} g)", dish_id, name, full_weight);
        Ok(record)
    }

    fn get(&self, dish_id: &str) -> Result<Option<ReferenceRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(dish_id).cloned())
    }

    fn find_all(&self) -> Result<Vec<ReferenceRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by_key(|r| (r.dish_id.parse::<u64>().unwrap_or(u64::MAX), r.dish_id.clone()));
        Ok(all)
    }

    fn load_image(&self, record: &ReferenceRecord) -> Result<Vec<u8>> {
        let path = self.image_dir.join(&record.reference_image);
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ids_are_sequential_and_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let repo = FileReferenceRepository::open(dir.path()).unwrap();
            assert_eq!(repo.add("Curry", 400.0, b"jpeg-1").unwrap().dish_id, "1");
            assert_eq!(repo.add("Salad", 150.0, b"jpeg-2").unwrap().dish_id, "2");
        }
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        let rec = repo.add("Soup", 250.0, b"jpeg-3").unwrap();
        assert_eq!(rec.dish_id, "3");

        let names: Vec<_> = repo.find_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Curry", "Salad", "Soup"]);
    }

    #[test]
    fn test_image_stored_with_safe_name_and_hash() {
        let dir = tempdir().unwrap();
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        let rec = repo.add("Beef/Rice bowl!", 520.0, b"image-bytes").unwrap();

        assert_eq!(rec.reference_image, "BeefRice bowl_1.jpg");
        assert_eq!(rec.image_sha256, sha256_hex(b"image-bytes"));
        assert_eq!(repo.load_image(&rec).unwrap(), b"image-bytes");
        assert!(repo.image_dir().join("BeefRice bowl_1.jpg").exists());
    }

    #[test]
    fn test_get_missing_dish() {
        let dir = tempdir().unwrap();
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        assert!(repo.get("42").unwrap().is_none());
    }

    #[test]
    fn test_invalid_registration_rejected() {
        let dir = tempdir().unwrap();
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        assert!(matches!(repo.add("  ", 100.0, b"x"), Err(Error::InvalidParameter(_))));
        assert!(matches!(repo.add("Soup", 0.0, b"x"), Err(Error::InvalidParameter(_))));
        assert!(repo.find_all().unwrap().is_empty());
    }

    #[test]
    fn test_missing_image_file_reported() {
        let dir = tempdir().unwrap();
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        let rec = repo.add("Curry", 400.0, b"jpeg").unwrap();
        fs::remove_file(repo.image_dir().join(&rec.reference_image)).unwrap();
        assert!(matches!(repo.load_image(&rec), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_failed_save_rolls_back_registration() {
        let dir = tempdir().unwrap();
        let repo = FileReferenceRepository::open(dir.path()).unwrap();
        fs::create_dir(dir.path().join(DATABASE_FILE)).unwrap();

        assert!(repo.add("Curry", 400.0, b"jpeg").is_err());
        assert!(repo.find_all().unwrap().is_empty());
        assert!(repo.get("1").unwrap().is_none());
        assert_eq!(fs::read_dir(repo.image_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
