//! Color primitives, distance measures, and dominant-color clustering.
//!
//! All math operates on 8-bit sRGB. Two distances are provided: plain
//! Euclidean (the palette dedup invariant is specified in Euclidean terms)
//! and a "redmean" weighted distance that approximates perceptual
//! difference without a full Lab conversion (page-vs-palette checks).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two swatches closer than this (Euclidean) are considered duplicates;
/// ingestion keeps the first-seen entry.
pub const SWATCH_DEDUP_DISTANCE: f64 = 10.0;

/// Default maximum redmean distance at which a sampled page color still
/// counts as on-palette.
pub const DEFAULT_PALETTE_TOLERANCE: f64 = 24.0;

/// Distances above `tolerance` but at most this multiple of it are marginal
/// (low severity); anything beyond is a clear mismatch (medium severity).
pub const PALETTE_MARGINAL_FACTOR: f64 = 2.0;

/// Default number of clusters for dominant-color extraction.
pub const DEFAULT_KMEANS_K: usize = 5;

/// Iteration cap for the k-means loop.
pub const KMEANS_MAX_ITERS: usize = 24;

/// Fixed seed for k-means++ initialization. Dominant-color output must be
/// deterministic for identical pixel input.
const KMEANS_SEED: u64 = 7;

// ---------------------------------------------------------------------------
// Rgb
// ---------------------------------------------------------------------------

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string (leading `#` optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::Validation(format!(
                "Invalid hex color '{hex}'. Expected #RRGGBB"
            )));
        }
        let parse = |s: &str| {
            u8::from_str_radix(s, 16)
                .map_err(|e| CoreError::Validation(format!("Invalid hex color '{hex}': {e}")))
        };
        Ok(Self {
            r: parse(&digits[0..2])?,
            g: parse(&digits[2..4])?,
            b: parse(&digits[4..6])?,
        })
    }

    /// Format as `#RRGGBB` (uppercase).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Rec. 601 luma in `0.0..=255.0`.
    pub fn luminance(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Channel spread (max − min), a cheap saturation proxy in `0.0..=255.0`.
    pub fn chroma(self) -> f64 {
        let max = self.r.max(self.g).max(self.b) as f64;
        let min = self.r.min(self.g).min(self.b) as f64;
        max - min
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Distance measures
// ---------------------------------------------------------------------------

/// Plain Euclidean distance in RGB space, range `0.0..=441.7`.
pub fn euclidean_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// "Redmean" weighted RGB distance, a low-cost perceptual approximation.
///
/// Weights the red and blue differences by the mean red level so that
/// differences the eye notices more count more. Range `0.0..=~765`.
pub fn perceptual_distance(a: Rgb, b: Rgb) -> f64 {
    let rmean = (a.r as f64 + b.r as f64) / 2.0;
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    let wr = 2.0 + rmean / 256.0;
    let wb = 2.0 + (255.0 - rmean) / 256.0;
    (wr * dr * dr + 4.0 * dg * dg + wb * db * db).sqrt()
}

/// Index and perceptual distance of the closest palette entry, or `None`
/// for an empty palette.
pub fn nearest_swatch(color: Rgb, palette: &[Rgb]) -> Option<(usize, f64)> {
    palette
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, perceptual_distance(color, p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Arithmetic mean color of a pixel set. `None` when empty.
pub fn mean_color(pixels: &[Rgb]) -> Option<Rgb> {
    if pixels.is_empty() {
        return None;
    }
    let n = pixels.len() as f64;
    let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
    for p in pixels {
        r += p.r as f64;
        g += p.g as f64;
        b += p.b as f64;
    }
    Some(Rgb::new(
        (r / n).round() as u8,
        (g / n).round() as u8,
        (b / n).round() as u8,
    ))
}

// ---------------------------------------------------------------------------
// Dominant colors (k-means)
// ---------------------------------------------------------------------------

/// Extract up to `k` dominant colors from a pixel set.
///
/// Runs k-means with k-means++ seeding from a fixed RNG seed, so identical
/// input always yields identical output. Returned centroids are ordered by
/// cluster population, largest first; empty clusters are dropped, so fewer
/// than `k` colors may come back.
pub fn dominant_colors(pixels: &[Rgb], k: usize, max_iters: usize) -> Vec<Rgb> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(pixels.len());
    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);

    // k-means++ seeding: first centroid uniform, the rest weighted by
    // squared distance to the nearest chosen centroid.
    let mut centroids: Vec<[f64; 3]> = Vec::with_capacity(k);
    let first = pixels[rng.random_range(0..pixels.len())];
    centroids.push([first.r as f64, first.g as f64, first.b as f64]);

    while centroids.len() < k {
        let weights: Vec<f64> = pixels
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_dist(*p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= f64::EPSILON {
            // All pixels coincide with existing centroids; duplicates would
            // only produce empty clusters.
            break;
        }
        let mut target = rng.random_range(0.0..total);
        let mut chosen = pixels.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        let p = pixels[chosen];
        centroids.push([p.r as f64, p.g as f64, p.b as f64]);
    }

    let mut assignment = vec![0usize; pixels.len()];
    for _ in 0..max_iters {
        let mut changed = false;
        for (i, p) in pixels.iter().enumerate() {
            let mut best = 0usize;
            let mut best_d = f64::INFINITY;
            for (ci, c) in centroids.iter().enumerate() {
                let d = squared_dist(*p, c);
                if d < best_d {
                    best_d = d;
                    best = ci;
                }
            }
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }

        let mut sums = vec![[0.0f64; 3]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (i, p) in pixels.iter().enumerate() {
            let a = assignment[i];
            sums[a][0] += p.r as f64;
            sums[a][1] += p.g as f64;
            sums[a][2] += p.b as f64;
            counts[a] += 1;
        }
        for (ci, c) in centroids.iter_mut().enumerate() {
            if counts[ci] > 0 {
                let n = counts[ci] as f64;
                *c = [sums[ci][0] / n, sums[ci][1] / n, sums[ci][2] / n];
            }
        }
        if !changed {
            break;
        }
    }

    let mut counts = vec![0usize; centroids.len()];
    for &a in &assignment {
        counts[a] += 1;
    }
    let mut ranked: Vec<(usize, usize)> = counts
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, n)| *n > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .map(|(ci, _)| {
            let c = centroids[ci];
            Rgb::new(
                c[0].round().clamp(0.0, 255.0) as u8,
                c[1].round().clamp(0.0, 255.0) as u8,
                c[2].round().clamp(0.0, 255.0) as u8,
            )
        })
        .collect()
}

fn squared_dist(p: Rgb, c: &[f64; 3]) -> f64 {
    let dr = p.r as f64 - c[0];
    let dg = p.g as f64 - c[1];
    let db = p.b as f64 - c[2];
    dr * dr + dg * dg + db * db
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
