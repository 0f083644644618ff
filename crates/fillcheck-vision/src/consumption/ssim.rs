//! Windowed structural similarity over grayscale images.
//!
//! Uniform square window, sample covariance, data range 255. The score is the
//! mean over every window lying fully inside the image. Window sums come from
//! summed-area tables so the cost does not grow with the window size.

use fillcheck_types::{Error, Result};
use image::GrayImage;

const DATA_RANGE: f64 = 255.0;

/// Summed-area table with a zero guard row and column
struct Integral {
    stride: usize,
    data: Vec<f64>,
}

impl Integral {
    fn build(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut data = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += value(x, y);
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, data }
    }

    /// Sum over `[x, x + size) x [y, y + size)`
    fn window(&self, x: usize, y: usize, size: usize) -> f64 {
        let s = self.stride;
        let (x1, y1) = (x + size, y + size);
        self.data[y1 * s + x1] - self.data[y * s + x1] - self.data[y1 * s + x] + self.data[y * s + x]
    }
}

pub fn structural_similarity(
    a: &GrayImage,
    b: &GrayImage,
    window: u32,
    k1: f64,
    k2: f64,
) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::InvalidParameter(format!(
            "SSIM inputs differ in size: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let (width, height) = (a.width() as usize, a.height() as usize);
    let win = window as usize;
    if win < 2 || width < win || height < win {
        return Err(Error::InvalidParameter(format!(
            "SSIM window {} does not fit a {}x{} image",
            window, width, height
        )));
    }

    let pa = |x: usize, y: usize| a.get_pixel(x as u32, y as u32)[0] as f64;
    let pb = |x: usize, y: usize| b.get_pixel(x as u32, y as u32)[0] as f64;

    let sum_a = Integral::build(width, height, pa);
    let sum_b = Integral::build(width, height, pb);
    let sum_aa = Integral::build(width, height, |x, y| pa(x, y) * pa(x, y));
    let sum_bb = Integral::build(width, height, |x, y| pb(x, y) * pb(x, y));
    let sum_ab = Integral::build(width, height, |x, y| pa(x, y) * pb(x, y));

    let n = (win * win) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (k1 * DATA_RANGE).powi(2);
    let c2 = (k2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=height - win {
        for x in 0..=width - win {
            let ux = sum_a.window(x, y, win) / n;
            let uy = sum_b.window(x, y, win) / n;
            let vx = cov_norm * (sum_aa.window(x, y, win) / n - ux * ux);
            let vy = cov_norm * (sum_bb.window(x, y, win) / n - uy * uy);
            let vxy = cov_norm * (sum_ab.window(x, y, win) / n - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }
    Ok(total / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    #[test]
    fn test_identical_images_score_one() {
        let img = gradient(32, 24);
        let s = structural_similarity(&img, &img, 7, 0.01, 0.03).unwrap();
        assert!((s - 1.0).abs() < 1e-9, "ssim = {}", s);
    }

    #[test]
    fn test_inverted_image_scores_low() {
        let img = gradient(32, 32);
        let inverted = GrayImage::from_fn(32, 32, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        let s = structural_similarity(&img, &inverted, 7, 0.01, 0.03).unwrap();
        assert!(s < 0.0, "ssim = {}", s);
    }

    #[test]
    fn test_flat_images_with_different_levels() {
        let a = GrayImage::from_pixel(16, 16, Luma([100]));
        let b = GrayImage::from_pixel(16, 16, Luma([200]));
        let s = structural_similarity(&a, &b, 7, 0.01, 0.03).unwrap();
        // Only the luminance term differs: (2*100*200 + c1) / (100^2 + 200^2 + c1)
        let c1 = (0.01f64 * 255.0).powi(2);
        let expected = (2.0 * 100.0 * 200.0 + c1) / (100.0f64.powi(2) + 200.0f64.powi(2) + c1);
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_window_must_fit() {
        let img = gradient(5, 5);
        assert!(structural_similarity(&img, &img, 7, 0.01, 0.03).is_err());
        let other = gradient(6, 5);
        assert!(structural_similarity(&img, &other, 3, 0.01, 0.03).is_err());
    }
}
