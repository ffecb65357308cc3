//! Sparse keypoint detection, descriptor matching, and robust affine
//! fitting. This is the machinery behind logo localization: detect corners
//! on the reference mark and on a rendered page, match their local
//! appearance, and recover the placement transform from the survivors.
//!
//! The detector is a min-eigenvalue (Shi-Tomasi) corner test on a smoothed
//! grayscale copy. Descriptors are normalized intensity patches, so they are
//! insensitive to uniform lighting shifts but deliberately not to rotation.
//! Matching uses the 2-NN ratio test; pose recovery is RANSAC over exact
//! 3-point affine solves with a least-squares polish on the inlier set.

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::BoundingBox;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Corner acceptance threshold on the averaged structure-tensor minimum
/// eigenvalue. Flat paper and clean edges score near zero.
const CORNER_THRESHOLD: f64 = 100.0;

/// Non-maximum suppression radius in pixels.
const NMS_RADIUS_SQ: f32 = 25.0;

/// Descriptor patch is a GRID x GRID grid of bilinear samples.
const DESCRIPTOR_GRID: usize = 12;

/// Spacing between descriptor samples in pixels.
const DESCRIPTOR_STEP: f32 = 2.0;

/// Flattened descriptor length.
pub const DESCRIPTOR_LEN: usize = DESCRIPTOR_GRID * DESCRIPTOR_GRID;

/// Features closer than this to the image edge are discarded; the full
/// descriptor window plus blur support must stay in bounds.
const BORDER: u32 = 13;

/// RANSAC hypothesis count.
const RANSAC_ITERS: usize = 200;

/// Fixed seed so fitting is reproducible for identical match sets.
const RANSAC_SEED: u64 = 11;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A detected corner with its appearance descriptor.
#[derive(Debug, Clone)]
pub struct Feature {
    pub x: f32,
    pub y: f32,
    pub response: f32,
    pub descriptor: Vec<f32>,
}

/// Tuning knobs for detection, matching, and fitting.
#[derive(Debug, Clone)]
pub struct KeypointConfig {
    /// Cap on features kept per image after suppression.
    pub max_features: usize,
    /// Lowe ratio: best match distance must be below this fraction of the
    /// second best, otherwise the match is ambiguous and dropped.
    pub match_ratio: f64,
    /// Minimum RANSAC inliers for a detection to count.
    pub min_inliers: usize,
    /// Maximum reprojection residual (pixels) for a match to be an inlier.
    pub residual_tolerance: f64,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            max_features: 256,
            match_ratio: 0.75,
            min_inliers: 8,
            residual_tolerance: 3.0,
        }
    }
}

/// Row-major 2x3 affine map from reference coordinates to scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    /// `[a, b, tx, c, d, ty]`: `x' = a*x + b*y + tx`, `y' = c*x + d*y + ty`.
    pub coefficients: [f64; 6],
}

impl AffineTransform {
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, tx, c, d, ty] = self.coefficients;
        (a * x + b * y + tx, c * x + d * y + ty)
    }
}

/// A successful robust fit.
#[derive(Debug, Clone)]
pub struct AffineFit {
    pub transform: AffineTransform,
    /// Matches surviving the residual test.
    pub inliers: usize,
    /// Ratio-test matches the fit was estimated from.
    pub matches: usize,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Detect corner features on an image.
///
/// Returns at most `config.max_features` features, strongest first. Small
/// images (under the descriptor margin) yield no features.
pub fn detect_features(image: &RgbImage, config: &KeypointConfig) -> Vec<Feature> {
    let (w, h) = image.dimensions();
    if w <= 2 * BORDER || h <= 2 * BORDER {
        return Vec::new();
    }

    let gray = to_gray(image);
    let blurred = box_blur(&box_blur(&gray, w, h), w, h);

    let (gx, gy) = gradients(&blurred, w, h);

    // Candidate corners: averaged 3x3 structure tensor, minimum eigenvalue.
    let mut candidates: Vec<(u32, u32, f32)> = Vec::new();
    for y in BORDER..h - BORDER {
        for x in BORDER..w - BORDER {
            let mut sxx = 0.0f64;
            let mut syy = 0.0f64;
            let mut sxy = 0.0f64;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let idx = ((y as i32 + dy) as u32 * w + (x as i32 + dx) as u32) as usize;
                    let (px, py) = (gx[idx] as f64, gy[idx] as f64);
                    sxx += px * px;
                    syy += py * py;
                    sxy += px * py;
                }
            }
            sxx /= 9.0;
            syy /= 9.0;
            sxy /= 9.0;
            let diff = sxx - syy;
            let lambda_min = (sxx + syy - (diff * diff + 4.0 * sxy * sxy).sqrt()) / 2.0;
            if lambda_min > CORNER_THRESHOLD {
                candidates.push((x, y, lambda_min as f32));
            }
        }
    }

    // Greedy non-maximum suppression, strongest first. Ties break on
    // coordinates so output order is stable.
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| (a.1, a.0).cmp(&(b.1, b.0))));

    let mut features: Vec<Feature> = Vec::new();
    for (x, y, response) in candidates {
        if features.len() >= config.max_features {
            break;
        }
        let suppressed = features.iter().any(|f| {
            let dx = f.x - x as f32;
            let dy = f.y - y as f32;
            dx * dx + dy * dy < NMS_RADIUS_SQ
        });
        if suppressed {
            continue;
        }
        if let Some(descriptor) = sample_descriptor(&blurred, w, h, x as f32, y as f32) {
            features.push(Feature {
                x: x as f32,
                y: y as f32,
                response,
                descriptor,
            });
        }
    }
    features
}

fn to_gray(image: &RgbImage) -> Vec<f32> {
    image
        .pixels()
        .map(|p| 0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
        .collect()
}

/// 3x3 mean filter with clamped edges.
fn box_blur(src: &[f32], w: u32, h: u32) -> Vec<f32> {
    let mut out = vec![0.0f32; src.len()];
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let mut sum = 0.0f32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let sx = (x + dx).clamp(0, w as i32 - 1) as u32;
                    let sy = (y + dy).clamp(0, h as i32 - 1) as u32;
                    sum += src[(sy * w + sx) as usize];
                }
            }
            out[(y as u32 * w + x as u32) as usize] = sum / 9.0;
        }
    }
    out
}

/// Central-difference gradients; zero on the one-pixel frame.
fn gradients(src: &[f32], w: u32, h: u32) -> (Vec<f32>, Vec<f32>) {
    let mut gx = vec![0.0f32; src.len()];
    let mut gy = vec![0.0f32; src.len()];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = (y * w + x) as usize;
            gx[i] = (src[i + 1] - src[i - 1]) / 2.0;
            gy[i] = (src[i + w as usize] - src[i - w as usize]) / 2.0;
        }
    }
    (gx, gy)
}

/// Sample a normalized intensity patch around `(cx, cy)`.
///
/// Returns `None` for patches with no variance (nothing to match on).
fn sample_descriptor(blurred: &[f32], w: u32, h: u32, cx: f32, cy: f32) -> Option<Vec<f32>> {
    let half = (DESCRIPTOR_GRID as f32 - 1.0) / 2.0;
    let mut d = Vec::with_capacity(DESCRIPTOR_LEN);
    for gy in 0..DESCRIPTOR_GRID {
        for gx in 0..DESCRIPTOR_GRID {
            let ox = (gx as f32 - half) * DESCRIPTOR_STEP;
            let oy = (gy as f32 - half) * DESCRIPTOR_STEP;
            d.push(bilinear(blurred, w, h, cx + ox, cy + oy));
        }
    }
    let n = d.len() as f32;
    let mean = d.iter().sum::<f32>() / n;
    let var = d.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    if var < 1e-6 {
        return None;
    }
    let inv = 1.0 / var.sqrt();
    for v in &mut d {
        *v = (*v - mean) * inv;
    }
    Some(d)
}

fn bilinear(data: &[f32], w: u32, h: u32, x: f32, y: f32) -> f32 {
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let at = |xx: u32, yy: u32| data[(yy * w + xx) as usize];
    let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
    let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Match query descriptors against train descriptors with the 2-NN ratio
/// test. Returns `(query_index, train_index)` pairs.
///
/// Fewer than two train features means the ratio is undefined; no matches
/// are produced. Repeated textures self-reject: when the best and second
/// best are equally good the match is ambiguous.
pub fn match_features(query: &[Feature], train: &[Feature], max_ratio: f64) -> Vec<(usize, usize)> {
    if train.len() < 2 {
        return Vec::new();
    }
    let ratio_sq = (max_ratio * max_ratio) as f32;
    let mut out = Vec::new();
    for (qi, q) in query.iter().enumerate() {
        let mut best = f32::INFINITY;
        let mut second = f32::INFINITY;
        let mut best_ti = 0usize;
        for (ti, t) in train.iter().enumerate() {
            let d = descriptor_distance_sq(&q.descriptor, &t.descriptor);
            if d < best {
                second = best;
                best = d;
                best_ti = ti;
            } else if d < second {
                second = d;
            }
        }
        if best < ratio_sq * second {
            out.push((qi, best_ti));
        }
    }
    out
}

fn descriptor_distance_sq(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

// ---------------------------------------------------------------------------
// Robust fitting
// ---------------------------------------------------------------------------

/// Fit `to ~ A * from` robustly with RANSAC and refine on the inlier set.
///
/// Needs at least three pairs and at least `config.min_inliers` survivors,
/// otherwise `None`. Seeded sampling keeps results reproducible.
pub fn fit_affine(
    from: &[(f64, f64)],
    to: &[(f64, f64)],
    config: &KeypointConfig,
) -> Option<AffineFit> {
    let n = from.len();
    if n != to.len() || n < 3 || n < config.min_inliers {
        return None;
    }
    let tol_sq = config.residual_tolerance * config.residual_tolerance;
    let mut rng = StdRng::seed_from_u64(RANSAC_SEED);

    let mut best: Option<(AffineTransform, Vec<usize>)> = None;
    for _ in 0..RANSAC_ITERS {
        let i0 = rng.random_range(0..n);
        let mut i1 = rng.random_range(0..n);
        while i1 == i0 {
            i1 = rng.random_range(0..n);
        }
        let mut i2 = rng.random_range(0..n);
        while i2 == i0 || i2 == i1 {
            i2 = rng.random_range(0..n);
        }
        let transform = match solve_exact(
            [from[i0], from[i1], from[i2]],
            [to[i0], to[i1], to[i2]],
        ) {
            Some(t) => t,
            None => continue,
        };
        let inliers: Vec<usize> = (0..n)
            .filter(|&i| residual_sq(&transform, from[i], to[i]) <= tol_sq)
            .collect();
        let better = match &best {
            Some((_, current)) => inliers.len() > current.len(),
            None => true,
        };
        if better {
            best = Some((transform, inliers));
        }
    }

    let (hypothesis, inliers) = best?;
    if inliers.len() < config.min_inliers {
        return None;
    }

    // Polish with a least-squares solve over the inliers; keep the raw
    // hypothesis if the refit degenerates or loses support.
    let refined = solve_least_squares(from, to, &inliers);
    let (transform, inlier_count) = match refined {
        Some(t) => {
            let count = (0..n)
                .filter(|&i| residual_sq(&t, from[i], to[i]) <= tol_sq)
                .count();
            if count >= inliers.len() {
                (t, count)
            } else {
                (hypothesis, inliers.len())
            }
        }
        None => (hypothesis, inliers.len()),
    };

    Some(AffineFit {
        transform,
        inliers: inlier_count,
        matches: n,
    })
}

/// Match two feature sets and recover the placement transform.
pub fn match_and_fit(
    reference: &[Feature],
    scene: &[Feature],
    config: &KeypointConfig,
) -> Option<AffineFit> {
    let matches = match_features(reference, scene, config.match_ratio);
    if matches.len() < config.min_inliers.max(3) {
        return None;
    }
    let from: Vec<(f64, f64)> = matches
        .iter()
        .map(|&(qi, _)| (reference[qi].x as f64, reference[qi].y as f64))
        .collect();
    let to: Vec<(f64, f64)> = matches
        .iter()
        .map(|&(_, ti)| (scene[ti].x as f64, scene[ti].y as f64))
        .collect();
    fit_affine(&from, &to, config)
}

/// Project the reference image corners through the transform and return the
/// axis-aligned box around the projections.
pub fn locate(reference_size: (u32, u32), transform: &AffineTransform) -> BoundingBox {
    let (w, h) = (reference_size.0 as f64, reference_size.1 as f64);
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (cx, cy) in corners {
        let (px, py) = transform.apply(cx, cy);
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);
    }
    let x0 = min_x.floor() as i32;
    let y0 = min_y.floor() as i32;
    BoundingBox::new(x0, y0, max_x.ceil() as i32 - x0, max_y.ceil() as i32 - y0)
}

fn residual_sq(t: &AffineTransform, from: (f64, f64), to: (f64, f64)) -> f64 {
    let (px, py) = t.apply(from.0, from.1);
    let dx = px - to.0;
    let dy = py - to.1;
    dx * dx + dy * dy
}

/// Exact affine through three point pairs. `None` for collinear sources.
fn solve_exact(src: [(f64, f64); 3], dst: [(f64, f64); 3]) -> Option<AffineTransform> {
    let m = [
        [src[0].0, src[0].1, 1.0],
        [src[1].0, src[1].1, 1.0],
        [src[2].0, src[2].1, 1.0],
    ];
    let rx = [dst[0].0, dst[1].0, dst[2].0];
    let ry = [dst[0].1, dst[1].1, dst[2].1];
    let xs = solve3(&m, &rx)?;
    let ys = solve3(&m, &ry)?;
    Some(AffineTransform {
        coefficients: [xs[0], xs[1], xs[2], ys[0], ys[1], ys[2]],
    })
}

/// Normal-equation least squares over the indexed pairs.
fn solve_least_squares(
    from: &[(f64, f64)],
    to: &[(f64, f64)],
    indices: &[usize],
) -> Option<AffineTransform> {
    let mut m = [[0.0f64; 3]; 3];
    let mut rx = [0.0f64; 3];
    let mut ry = [0.0f64; 3];
    for &i in indices {
        let (x, y) = from[i];
        let (xp, yp) = to[i];
        let row = [x, y, 1.0];
        for r in 0..3 {
            for c in 0..3 {
                m[r][c] += row[r] * row[c];
            }
            rx[r] += row[r] * xp;
            ry[r] += row[r] * yp;
        }
    }
    let xs = solve3(&m, &rx)?;
    let ys = solve3(&m, &ry)?;
    Some(AffineTransform {
        coefficients: [xs[0], xs[1], xs[2], ys[0], ys[1], ys[2]],
    })
}

fn solve3(m: &[[f64; 3]; 3], rhs: &[f64; 3]) -> Option<[f64; 3]> {
    let det = det3(m);
    if det.abs() < 1e-9 {
        return None;
    }
    let mut out = [0.0f64; 3];
    for col in 0..3 {
        let mut replaced = *m;
        for row in 0..3 {
            replaced[row][col] = rhs[row];
        }
        out[col] = det3(&replaced) / det;
    }
    Some(out)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
