//! Bottle segmentation: edges, closing, largest outer contour, neck trim

use fillcheck_types::{BoundingBox, Error, Result};
use image::imageops;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::edges::canny;
use imageproc::morphology::close;
use imageproc::point::Point;
use log::debug;

use crate::calibration::VolumeCalibration;
use crate::color::to_gray;

/// The measurable part of a detected bottle
#[derive(Debug, Clone)]
pub struct BottleRegion {
    /// Bounding box of the bottle contour in full-image coordinates
    pub bounds: BoundingBox,
    /// Rows trimmed from the top of `bounds` as neck
    pub neck_offset: u32,
    /// `bounds.height - neck_offset`; height of `roi` and `mask`
    pub usable_height: u32,
    /// Crop of the image below the neck cutoff
    pub roi: RgbImage,
    /// Filled bottle contour over the same crop (0 / 255)
    pub mask: GrayImage,
    pub contour_area: f64,
}

impl BottleRegion {
    /// Image row where the region of interest starts
    pub fn roi_top(&self) -> u32 {
        self.bounds.y + self.neck_offset
    }
}

/// Locate the bottle and cut away its neck.
///
/// Fails with `NoBottleDetected` when the edge map has no outer contour.
pub fn segment_bottle(image: &RgbImage, calibration: &VolumeCalibration) -> Result<BottleRegion> {
    let (width, height) = image.dimensions();
    let gray = to_gray(image);
    let edges = canny(&gray, calibration.canny_low, calibration.canny_high);
    let closed = close(&edges, Norm::LInf, calibration.close_radius);

    let contours = find_contours::<i32>(&closed);
    debug!("segmentation: {} contours in {}x{} edge map", contours.len(), width, height);

    let (bottle, contour_area) = largest_outer_contour(&contours).ok_or_else(|| {
        Error::NoBottleDetected(format!("no contours found in {}x{} image", width, height))
    })?;

    let bounds = bounding_box(&bottle.points);
    let neck_offset = (bounds.height as f64 * calibration.neck_fraction) as u32;
    let usable_height = match bounds.height.checked_sub(neck_offset) {
        Some(h) if h > 0 => h,
        Some(_) => {
            return Err(Error::NoBottleDetected(format!(
                "bottle contour at ({}, {}) has no usable height",
                bounds.x, bounds.y
            )))
        }
        None => {
            return Err(Error::InvalidParameter(format!(
                "neck offset {} px exceeds bottle height {} px",
                neck_offset, bounds.height
            )))
        }
    };

    let mut full_mask = GrayImage::new(width, height);
    fill_contour(&mut full_mask, &bottle.points);

    let roi_top = bounds.y + neck_offset;
    let roi = imageops::crop_imm(image, bounds.x, roi_top, bounds.width, usable_height).to_image();
    let mask = imageops::crop_imm(&full_mask, bounds.x, roi_top, bounds.width, usable_height).to_image();

    debug!(
        "segmentation: bottle {:?}, area {:.0}, neck {} px, usable {} px",
        bounds, contour_area, neck_offset, usable_height
    );

    Ok(BottleRegion {
        bounds,
        neck_offset,
        usable_height,
        roi,
        mask,
        contour_area,
    })
}

/// Largest outer-border contour by polygon area; the first one wins ties
fn largest_outer_contour(contours: &[Contour<i32>]) -> Option<(&Contour<i32>, f64)> {
    let mut best: Option<(&Contour<i32>, f64)> = None;
    for contour in contours {
        if contour.border_type != BorderType::Outer || contour.points.is_empty() {
            continue;
        }
        let area = polygon_area(&contour.points);
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((contour, area)),
        }
    }
    best
}

/// Shoelace area of a closed polygon
pub(crate) fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice_area: i64 = (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
        })
        .sum();
    (twice_area as f64 / 2.0).abs()
}

/// Inclusive bounding rectangle of a non-empty point set
pub(crate) fn bounding_box(points: &[Point<i32>]) -> BoundingBox {
    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    }
}

/// Fill the contour interior and its boundary pixels
fn fill_contour(mask: &mut GrayImage, points: &[Point<i32>]) {
    let mut polygon = points.to_vec();
    polygon.dedup();
    // draw_polygon_mut rejects explicitly closed polygons
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        draw_polygon_mut(mask, &polygon, Luma([255]));
    }

    let (w, h) = mask.dimensions();
    for p in points {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
            mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn bottle_on_white(x: i32, y: i32, w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(200, 300, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Rgb([150, 150, 150]));
        img
    }

    #[test]
    fn test_polygon_area_square() {
        let square = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_bounding_box_is_inclusive() {
        let pts = [Point::new(3, 4), Point::new(7, 4), Point::new(5, 9)];
        assert_eq!(
            bounding_box(&pts),
            BoundingBox { x: 3, y: 4, width: 5, height: 6 }
        );
    }

    #[test]
    fn test_flat_image_has_no_bottle() {
        let img = RgbImage::from_pixel(120, 160, Rgb([90, 140, 200]));
        let err = segment_bottle(&img, &VolumeCalibration::STANDARD).unwrap_err();
        assert!(matches!(err, Error::NoBottleDetected(_)));
    }

    #[test]
    fn test_rectangle_bottle_bounds_and_neck() {
        let img = bottle_on_white(40, 30, 100, 200);
        let region = segment_bottle(&img, &VolumeCalibration::STANDARD).unwrap();

        let b = region.bounds;
        assert!((38..=41).contains(&b.x), "x = {}", b.x);
        assert!((28..=31).contains(&b.y), "y = {}", b.y);
        assert!((99..=103).contains(&b.width), "width = {}", b.width);
        assert!((199..=203).contains(&b.height), "height = {}", b.height);

        assert_eq!(region.neck_offset, (b.height as f64 * 0.2) as u32);
        assert_eq!(region.usable_height, b.height - region.neck_offset);
        assert_eq!(region.roi.dimensions(), (b.width, region.usable_height));
        assert_eq!(region.mask.dimensions(), region.roi.dimensions());

        // Interior of the bottle is inside the mask
        let cx = b.width / 2;
        let cy = region.usable_height / 2;
        assert_eq!(region.mask.get_pixel(cx, cy)[0], 255);
    }

    #[test]
    fn test_oversized_neck_fraction_is_an_error() {
        let img = bottle_on_white(40, 30, 100, 200);
        let cal = VolumeCalibration {
            neck_fraction: 1.5,
            ..VolumeCalibration::STANDARD
        };
        let err = segment_bottle(&img, &cal).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)), "{:?}", err);
    }

    #[test]
    fn test_largest_contour_wins() {
        let mut img = bottle_on_white(20, 20, 40, 60);
        draw_filled_rect_mut(&mut img, Rect::at(90, 40).of_size(80, 220), Rgb([120, 120, 120]));
        let region = segment_bottle(&img, &VolumeCalibration::STANDARD).unwrap();
        assert!(region.bounds.x >= 85, "picked the small box at x = {}", region.bounds.x);
        assert!(region.bounds.height > 200);
    }
}
