//! Page color sampling and bucketing.
//!
//! Palette conformance looks at flat page regions (backgrounds, decorative
//! fills, rules), not photographs or logo art. Callers pass exclusion boxes
//! for those; the sampler walks a coarse grid over what remains and the
//! bucketer collapses samples into quantized color groups, dropping
//! document furniture (paper white, body-text black, plain grays).

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::geometry::BoundingBox;

/// Default sampling stride in pixels.
pub const DEFAULT_SAMPLE_STRIDE: u32 = 8;

/// Quantization step for bucket keys.
pub const DEFAULT_BUCKET_SIZE: u8 = 16;

/// Buckets holding less than this fraction of samples are noise.
pub const MIN_BUCKET_FRACTION: f64 = 0.005;

/// Chroma under which a color reads as gray.
const NEUTRAL_CHROMA: f64 = 12.0;

/// Luminance above which a color reads as paper white.
const NEAR_WHITE_LUMINANCE: f64 = 242.0;

/// Luminance below which a color reads as text black.
const NEAR_BLACK_LUMINANCE: f64 = 16.0;

/// A group of samples sharing a quantized color key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBucket {
    /// Mean color of the bucket's members.
    pub rgb: Rgb,
    pub count: usize,
}

/// Grays, near-white, and near-black are document furniture, never palette
/// violations.
pub fn is_neutral(color: Rgb) -> bool {
    color.chroma() < NEUTRAL_CHROMA
        || color.luminance() > NEAR_WHITE_LUMINANCE
        || color.luminance() < NEAR_BLACK_LUMINANCE
}

/// Sample pixel colors on a regular grid, skipping excluded regions.
///
/// Samples sit at cell centers (`stride / 2` offset) so a small image still
/// contributes. A zero stride is treated as one.
pub fn grid_sample(image: &image::RgbImage, stride: u32, exclude: &[BoundingBox]) -> Vec<Rgb> {
    let stride = stride.max(1);
    let (w, h) = image.dimensions();
    let mut out = Vec::new();
    let mut y = stride / 2;
    while y < h {
        let mut x = stride / 2;
        while x < w {
            let excluded = exclude
                .iter()
                .any(|b| b.contains_point(x as i32, y as i32));
            if !excluded {
                let p = image.get_pixel(x, y);
                out.push(Rgb::new(p.0[0], p.0[1], p.0[2]));
            }
            x += stride;
        }
        y += stride;
    }
    out
}

/// Collapse samples into quantized buckets.
///
/// Buckets are keyed by `channel / bucket_size`; each carries the mean of
/// its members. Noise buckets (under [`MIN_BUCKET_FRACTION`]) and neutral
/// buckets are dropped. Output is ordered by population, largest first,
/// with the quantized key as tiebreak so results are stable.
pub fn bucket_colors(samples: &[Rgb], bucket_size: u8) -> Vec<ColorBucket> {
    if samples.is_empty() {
        return Vec::new();
    }
    let step = bucket_size.max(1);
    let mut groups: std::collections::HashMap<(u8, u8, u8), (u64, u64, u64, usize)> =
        std::collections::HashMap::new();
    for s in samples {
        let key = (s.r / step, s.g / step, s.b / step);
        let entry = groups.entry(key).or_insert((0, 0, 0, 0));
        entry.0 += s.r as u64;
        entry.1 += s.g as u64;
        entry.2 += s.b as u64;
        entry.3 += 1;
    }

    let min_count = ((samples.len() as f64) * MIN_BUCKET_FRACTION).ceil() as usize;
    let mut buckets: Vec<((u8, u8, u8), ColorBucket)> = groups
        .into_iter()
        .filter(|(_, (_, _, _, count))| *count >= min_count.max(1))
        .map(|(key, (r, g, b, count))| {
            let n = count as u64;
            let mean = Rgb::new(
                ((r + n / 2) / n) as u8,
                ((g + n / 2) / n) as u8,
                ((b + n / 2) / n) as u8,
            );
            (key, ColorBucket { rgb: mean, count })
        })
        .filter(|(_, bucket)| !is_neutral(bucket.rgb))
        .collect();

    buckets.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
    buckets.into_iter().map(|(_, bucket)| bucket).collect()
}
