//! Image scanning and validation

use fillcheck_types::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image file and return its dimensions.
///
/// Only the header is read; images larger than `max_side` on either axis are
/// rejected before any pixel data is decoded.
pub fn validate_image(path: &Path, max_side: u32) -> Result<(u32, u32)> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    let (width, height) = image::image_dimensions(path)?;
    if width.max(height) > max_side {
        return Err(Error::InvalidParameter(format!(
            "{} is {}x{}, longest side must be at most {}",
            path.display(),
            width,
            height,
            max_side
        )));
    }

    Ok((width, height))
}

/// Validate, then read the raw bytes
pub fn read_image(path: &Path, max_side: u32) -> Result<Vec<u8>> {
    validate_image(path, max_side)?;
    Ok(std::fs::read(path)?)
}

/// Scan a directory for image files
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_supported_image(p))
        .collect();

    // Sort by filename for consistent ordering
    images.sort_by(|a, b| {
        a.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .cmp(b.file_name().and_then(|n| n.to_str()).unwrap_or(""))
    });

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("bottle.jpg")));
        assert!(is_supported_image(Path::new("bottle.JPEG")));
        assert!(is_supported_image(Path::new("plate.png")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("bottle")));
    }

    #[test]
    fn test_scan_directory_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        img.save(dir.path().join("b.png")).unwrap();
        img.save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();

        let found = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(64, 8).save(&path).unwrap();
        assert_eq!(validate_image(&path, 64).unwrap(), (64, 8));
        assert!(matches!(validate_image(&path, 32), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_validate_missing_file() {
        let err = validate_image(Path::new("/nonexistent/bottle.jpg"), 4096).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
