//! Image-quality heuristics for photographic regions.
//!
//! Two cheap scores: variance of the Laplacian (sharpness) and the fraction
//! of low-gradient pixels (flatness). Low sharpness flags out-of-focus or
//! upscaled photos; high flatness flags clip-art and posterized fills where
//! a photographic asset was expected.

use image::RgbImage;

/// Laplacian-variance floor below which a region reads as blurry.
pub const DEFAULT_MIN_SHARPNESS: f64 = 35.0;

/// Flat-pixel fraction above which a region reads as non-photographic.
pub const DEFAULT_MAX_FLATNESS: f64 = 0.88;

/// Gradient magnitude under which a pixel counts as flat.
const FLAT_GRADIENT: f64 = 4.0;

/// Variance of the 3x3 Laplacian over interior pixels.
///
/// Sharp detail produces large positive and negative responses and a high
/// variance. Images smaller than 3x3 score `0.0`.
pub fn blur_score(image: &RgbImage) -> f64 {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let gray = luma(image);
    let w = w as usize;
    let mut responses = Vec::with_capacity((w - 2) * (h as usize - 2));
    for y in 1..h as usize - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let lap = gray[i - 1] + gray[i + 1] + gray[i - w] + gray[i + w] - 4.0 * gray[i];
            responses.push(lap);
        }
    }
    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n
}

/// Fraction of interior pixels whose gradient magnitude stays under the
/// flatness threshold. Degenerate images score `1.0`.
pub fn flatness_score(image: &RgbImage) -> f64 {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return 1.0;
    }
    let gray = luma(image);
    let w = w as usize;
    let mut flat = 0usize;
    let mut total = 0usize;
    for y in 1..h as usize - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let gx = (gray[i + 1] - gray[i - 1]) / 2.0;
            let gy = (gray[i + w] - gray[i - w]) / 2.0;
            if (gx * gx + gy * gy).sqrt() < FLAT_GRADIENT {
                flat += 1;
            }
            total += 1;
        }
    }
    flat as f64 / total as f64
}

fn luma(image: &RgbImage) -> Vec<f64> {
    image
        .pixels()
        .map(|p| 0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64)
        .collect()
}
