//! Debug overlays returned alongside each estimate

use fillcheck_types::{BoundingBox, LiquidBand};
use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const BOTTLE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LIQUID_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const FOOD_TINT: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: u32 = 2;

/// Bottle bounding box plus the detected liquid band, on a copy of `image`
pub fn annotate_volume(
    image: &RgbImage,
    bottle: &BoundingBox,
    neck_offset: u32,
    band: &LiquidBand,
) -> RgbImage {
    let mut canvas = image.clone();
    draw_box(&mut canvas, bottle.x, bottle.y, bottle.width, bottle.height, BOTTLE_COLOR);

    let band_top = bottle.y + neck_offset + band.top;
    draw_box(
        &mut canvas,
        bottle.x,
        band_top,
        bottle.width,
        band.height() + 1,
        LIQUID_COLOR,
    );
    canvas
}

/// Reference and current frames side by side, food pixels tinted
pub fn annotate_consumption(
    current: &RgbImage,
    reference: &RgbImage,
    current_food: &GrayImage,
    reference_food: &GrayImage,
) -> RgbImage {
    let width = reference.width() + current.width();
    let height = reference.height().max(current.height());
    let mut canvas = RgbImage::new(width, height);

    imageops::replace(&mut canvas, &tint(reference, reference_food), 0, 0);
    imageops::replace(&mut canvas, &tint(current, current_food), reference.width() as i64, 0);
    canvas
}

/// 50/50 blend of masked pixels toward the food tint
fn tint(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if x < mask.width() && y < mask.height() && mask.get_pixel(x, y)[0] > 0 {
            for c in 0..3 {
                px[c] = ((px[c] as u16 + FOOD_TINT[c] as u16) / 2) as u8;
            }
        }
    }
    out
}

/// Hollow rectangle `thickness` pixels wide, growing inward
fn draw_box(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
