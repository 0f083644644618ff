//! Integration tests for the analysis service and batch runner

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fillcheck_app::app::{AnalysisService, AnalysisServiceError};
use fillcheck_app::batch::{run_volume_batch, BatchOptions, BatchVolumeResults};
use fillcheck_app::export::export_to_excel;
use fillcheck_app::scanner::scan_directory;
use fillcheck_domain::repository::{ReferenceRepository, WasteSink};
use fillcheck_infra::{FileReferenceRepository, MemoryWasteLog};
use fillcheck_vision::{KitchenZone, VolumeCalibration, ZoneRect};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tempfile::{tempdir, TempDir};

fn save(img: &RgbImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

fn bottle(liquid_top: i32) -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 800, Rgb([255, 255, 255]));
    draw_filled_rect_mut(&mut img, Rect::at(50, 50).of_size(300, 700), Rgb([150, 150, 150]));
    let rows = (750 - liquid_top) as u32;
    let amber = Rgb([200, 110, 20]);
    draw_filled_rect_mut(&mut img, Rect::at(50, liquid_top).of_size(300, rows), amber);
    img
}

fn food_plate() -> RgbImage {
    RgbImage::from_fn(224, 224, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([90, 40, 10])
        } else {
            Rgb([10, 20, 5])
        }
    })
}

fn service(store: &TempDir) -> (AnalysisService, Arc<MemoryWasteLog>) {
    let repo = FileReferenceRepository::open(store.path()).unwrap();
    let waste = Arc::new(MemoryWasteLog::new());
    (AnalysisService::new(Box::new(repo), waste.clone()), waste)
}

#[test]
fn test_measure_bottle_from_disk() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, _) = service(&store);

    let path = save(&bottle(600), photos.path(), "bottle.png");
    let report = service.measure_bottle(&path, 750.0).unwrap();
    assert!((26.0..=27.3).contains(&report.estimate.percent));
}

#[test]
fn test_oversized_image_rejected_before_decode() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, _) = service(&store);
    let service = service.with_limits(512, 90);

    let path = save(&bottle(600), photos.path(), "bottle.png");
    let err = service.measure_bottle(&path, 750.0).unwrap_err();
    assert!(matches!(err, AnalysisServiceError::InvalidParameter(_)), "{:?}", err);
}

#[test]
fn test_flat_photo_reports_segmentation_stage() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, _) = service(&store);

    let flat = RgbImage::from_pixel(200, 300, Rgb([90, 90, 90]));
    let path = save(&flat, photos.path(), "flat.png");
    match service.measure_bottle(&path, 750.0).unwrap_err() {
        AnalysisServiceError::Estimation { stage, .. } => assert_eq!(stage, "segmentation"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_register_and_analyze_dish_logs_waste() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, waste) = service(&store);

    let full = save(&food_plate(), photos.path(), "curry_full.png");
    let dish = service.register_dish("Curry", 400.0, &full).unwrap();
    assert_eq!(dish.dish_id, "1");
    assert_eq!(service.list_dishes().unwrap().len(), 1);

    // The stored reference itself: unchanged plate
    let repo = FileReferenceRepository::open(store.path()).unwrap();
    let stored = repo.load_image(&dish).unwrap();
    let unchanged = photos.path().join("unchanged.jpg");
    std::fs::write(&unchanged, stored).unwrap();

    let first = service.analyze_dish("1", &unchanged, Some("line_a".to_string())).unwrap();
    assert!((first.report.estimate.consumption_ratio - 0.1).abs() < 1e-9);
    assert!((first.record.wasted_weight - 360.0).abs() < 1e-9);

    let white = RgbImage::from_pixel(224, 224, Rgb([255, 255, 255]));
    let empty = save(&white, photos.path(), "empty.png");
    let second = service.analyze_dish("1", &empty, Some("line_b".to_string())).unwrap();
    let est = &second.report.estimate;
    assert!(est.consumption_ratio >= 0.8, "ratio {}", est.consumption_ratio);
    assert!((est.consumed_weight + est.wasted_weight - 400.0).abs() < 1e-9);

    assert_eq!(waste.records().unwrap().len(), 2);
    let stats = service.statistics().unwrap();
    let summary = stats.summary.unwrap();
    assert_eq!(summary.count, 2);
    let logged = first.record.wasted_weight + second.record.wasted_weight;
    assert!((summary.total - logged).abs() < 1e-9);
    assert_eq!(stats.zone_averages.len(), 2);

    assert_eq!(service.reset_statistics().unwrap(), 2);
    assert!(service.statistics().unwrap().summary.is_none());
}

#[test]
fn test_unknown_dish_is_not_found() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, _) = service(&store);
    let plate = save(&food_plate(), photos.path(), "plate.png");

    let err = service.analyze_dish("99", &plate, None).unwrap_err();
    assert!(matches!(err, AnalysisServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "Dish not found with ID: 99");
}

#[test]
fn test_batch_run_and_export() {
    let photos = tempdir().unwrap();
    save(&bottle(600), photos.path(), "a_quarter.png");
    save(&bottle(470), photos.path(), "b_half.png");
    save(&RgbImage::from_pixel(200, 300, Rgb([90, 90, 90])), photos.path(), "c_flat.png");

    let images = scan_directory(photos.path()).unwrap();
    let options = BatchOptions {
        capacity_ml: 750.0,
        jobs: 2,
        max_image_side: 4096,
        calibration: VolumeCalibration::STANDARD,
    };
    let done = AtomicUsize::new(0);
    let results = run_volume_batch(&images, &options, |_| {
        done.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(done.load(Ordering::SeqCst), 3);
    assert_eq!((results.total, results.successful, results.failed), (3, 2, 1));
    assert!(results.entries[0].image_path.ends_with("a_quarter.png"));
    assert!(results.entries[0].estimate.volume_ml < results.entries[1].estimate.volume_ml);
    assert_eq!(results.failures[0].stage.as_deref(), Some("segmentation"));

    let out = tempdir().unwrap();
    let json = out.path().join("results.json");
    results.save(&json).unwrap();
    let loaded = BatchVolumeResults::load(&json).unwrap();
    assert_eq!(loaded.successful, 2);

    let xlsx = out.path().join("results.xlsx");
    export_to_excel(&loaded, &xlsx).unwrap();
    assert!(xlsx.exists());
}

#[test]
fn test_kitchen_zones_logged_per_zone() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, waste) = service(&store);

    let mut kitchen = RgbImage::from_pixel(300, 200, Rgb([30, 30, 30]));
    draw_filled_rect_mut(&mut kitchen, Rect::at(150, 0).of_size(150, 200), Rgb([230, 230, 230]));
    let path = save(&kitchen, photos.path(), "kitchen.png");

    let zones = [
        KitchenZone::new("prep_station", ZoneRect::new(200, 50, 80, 100)),
        KitchenZone::new("dishwashing", ZoneRect::new(10, 50, 80, 100)),
        KitchenZone::new("storage_area", ZoneRect::new(400, 400, 50, 50)),
    ];
    let analysis = service.analyze_kitchen_zones(&path, &zones).unwrap();

    let scores: Vec<f64> = analysis.report.zones.iter().map(|z| z.score).collect();
    assert!(scores[0] > scores[1]);
    assert!(scores[0] > 1.0, "prep factor lifts a bright zone past 1: {}", scores[0]);

    let logged = waste.records().unwrap();
    assert_eq!(logged.len(), 3);
    assert_eq!(logged[0].zone.as_deref(), Some("prep_station"));
    assert_eq!(logged[1].zone.as_deref(), Some("dishwashing"));
    assert!((logged[1].wasted_weight - scores[1]).abs() < 1e-12);

    let stats = service.statistics().unwrap();
    assert_eq!(stats.zone_averages.len(), 3);
}

#[test]
fn test_kitchen_requires_zones() {
    let store = tempdir().unwrap();
    let photos = tempdir().unwrap();
    let (service, waste) = service(&store);

    let path = save(&RgbImage::new(50, 50), photos.path(), "kitchen.png");
    let err = service.analyze_kitchen_zones(&path, &[]).unwrap_err();
    assert!(matches!(err, AnalysisServiceError::InvalidParameter(_)));
    assert!(waste.records().unwrap().is_empty());
}
