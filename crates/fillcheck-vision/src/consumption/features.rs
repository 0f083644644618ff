//! Scalar similarity signals between a current and a reference plate

use image::{GrayImage, Luma, RgbImage};

/// Per-channel histograms normalized to unit mass
pub fn channel_histograms(image: &RgbImage, bins: u32) -> [Vec<f64>; 3] {
    let bins = bins.clamp(1, 256) as usize;
    let mut hist = [vec![0.0; bins], vec![0.0; bins], vec![0.0; bins]];
    for px in image.pixels() {
        for (c, h) in hist.iter_mut().enumerate() {
            h[px[c] as usize * bins / 256] += 1.0;
        }
    }
    let total = (image.width() as f64) * (image.height() as f64);
    if total > 0.0 {
        for h in hist.iter_mut() {
            h.iter_mut().for_each(|v| *v /= total);
        }
    }
    hist
}

/// Mean over channels of `sum(min(a, b))`, in [0, 1]
pub fn histogram_intersection(a: &[Vec<f64>; 3], b: &[Vec<f64>; 3]) -> f64 {
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(ha, hb)| ha.iter().zip(hb).map(|(x, y)| x.min(*y)).sum::<f64>())
        .sum();
    (sum / 3.0).clamp(0.0, 1.0)
}

pub fn histogram_similarity(current: &RgbImage, reference: &RgbImage, bins: u32) -> f64 {
    histogram_intersection(
        &channel_histograms(current, bins),
        &channel_histograms(reference, bins),
    )
}

/// `1 - mse / 255^2` over grayscale pixels; 1 means identical
pub fn normalized_mse(a: &GrayImage, b: &GrayImage) -> f64 {
    let n = a.pixels().len().min(b.pixels().len());
    if n == 0 {
        return 1.0;
    }
    let sse: f64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(p, q)| {
            let d = p[0] as f64 - q[0] as f64;
            d * d
        })
        .sum();
    1.0 - sse / n as f64 / (255.0 * 255.0)
}

/// Mean of every RGB sample
pub fn mean_brightness(image: &RgbImage) -> f64 {
    let samples = image.as_raw();
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64
}

/// Brightening of the current plate, in [0, 1]; darkening counts as 0
pub fn brightness_gain(current: &RgbImage, reference: &RgbImage) -> f64 {
    let (cur, refr) = (mean_brightness(current), mean_brightness(reference));
    if cur > refr {
        (cur - refr) / 255.0
    } else {
        0.0
    }
}

/// Pixels darker than `cutoff` are food (255), the rest plate or background
pub fn food_mask(gray: &GrayImage, cutoff: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] < cutoff {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

pub fn mask_fraction(mask: &GrayImage) -> f64 {
    let total = mask.pixels().len();
    if total == 0 {
        return 0.0;
    }
    mask.pixels().filter(|p| p[0] > 0).count() as f64 / total as f64
}

/// Remaining food relative to the reference plate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodArea {
    pub current_fraction: f64,
    pub reference_fraction: f64,
    /// Clamped `current / reference`
    pub ratio: f64,
    /// The reference had no food or the ratio hit a clamp bound
    pub clamped: bool,
}

pub fn food_area(current_fraction: f64, reference_fraction: f64, min: f64, max: f64) -> FoodArea {
    let (raw, no_reference) = if reference_fraction > 0.0 {
        (current_fraction / reference_fraction, false)
    } else {
        (1.0, true)
    };
    let ratio = raw.clamp(min, max);
    FoodArea {
        current_fraction,
        reference_fraction,
        ratio,
        clamped: no_reference || ratio != raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_histograms_have_unit_mass() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 7]));
        for h in channel_histograms(&img, 64) {
            assert_eq!(h.len(), 64);
            assert!((h.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_histogram_similarity_bounds() {
        let black = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        assert!((histogram_similarity(&black, &black, 64) - 1.0).abs() < 1e-12);
        assert_eq!(histogram_similarity(&black, &white, 64), 0.0);
    }

    #[test]
    fn test_half_overlap_histogram() {
        let a = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let b = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        assert!((histogram_similarity(&a, &b, 64) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_mse() {
        let a = GrayImage::from_pixel(4, 4, Luma([0]));
        let b = GrayImage::from_pixel(4, 4, Luma([255]));
        assert_eq!(normalized_mse(&a, &a), 1.0);
        assert_eq!(normalized_mse(&a, &b), 0.0);
    }

    #[test]
    fn test_brightness_gain_only_when_brighter() {
        let dark = RgbImage::from_pixel(4, 4, Rgb([51, 51, 51]));
        let light = RgbImage::from_pixel(4, 4, Rgb([102, 102, 102]));
        assert!((brightness_gain(&light, &dark) - 0.2).abs() < 1e-12);
        assert_eq!(brightness_gain(&dark, &light), 0.0);
    }

    #[test]
    fn test_food_mask_cutoff() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[0, 229, 230, 255][x as usize]]));
        let mask = food_mask(&gray, 230);
        assert_eq!(mask_fraction(&mask), 0.5);
    }

    #[test]
    fn test_food_area_ratio_and_clamp() {
        let half = food_area(0.2, 0.4, 0.1, 1.0);
        assert_eq!(half.ratio, 0.5);
        assert!(!half.clamped);

        let empty = food_area(0.0, 0.4, 0.1, 1.0);
        assert_eq!(empty.ratio, 0.1);
        assert!(empty.clamped);

        let no_reference = food_area(0.3, 0.0, 0.1, 1.0);
        assert_eq!(no_reference.ratio, 1.0);
        assert!(no_reference.clamped);
    }
}
