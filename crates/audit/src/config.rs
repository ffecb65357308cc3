//! Audit configuration.

use onbrand_core::color::DEFAULT_PALETTE_TOLERANCE;
use onbrand_core::geometry::DEFAULT_ASPECT_RATIO_TOLERANCE;
use onbrand_core::keypoints::KeypointConfig;
use onbrand_core::logo_rule::DEFAULT_COLOR_FIDELITY_TOLERANCE;
use onbrand_core::quality::{DEFAULT_MAX_FLATNESS, DEFAULT_MIN_SHARPNESS};
use onbrand_core::sampling::DEFAULT_SAMPLE_STRIDE;
use onbrand_core::typography::{DEFAULT_GLYPH_SIMILARITY, DEFAULT_MISMATCH_FRACTION};

/// Image embedding similarity below which a photograph does not read as
/// on-brand.
pub const DEFAULT_VIBE_SIMILARITY: f64 = 0.22;

/// Audit tuning loaded from environment variables.
///
/// Thresholds default to the shared core constants so audit behavior and
/// the documented invariants stay in one place.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Pages audited concurrently (default: `4`).
    pub max_concurrent_pages: usize,
    /// Lowe ratio for keypoint matching (default: `0.75`).
    pub match_ratio: f64,
    /// Minimum RANSAC inliers for a logo detection (default: `8`).
    pub min_inliers: usize,
    /// Maximum reprojection residual in pixels (default: `3.0`).
    pub residual_tolerance: f64,
    /// Allowed logo aspect-ratio deviation (default: `0.20`).
    pub aspect_ratio_tolerance: f64,
    /// Perceptual distance above which a matched logo counts as recolored
    /// (default: `30.0`).
    pub logo_color_tolerance: f64,
    /// Perceptual distance to the nearest palette entry that still passes
    /// (default: `24.0`).
    pub palette_tolerance: f64,
    /// Grid sampling stride in pixels (default: `8`).
    pub sample_stride: u32,
    /// Cosine similarity below which a glyph mismatches all registered
    /// typefaces (default: `0.75`).
    pub glyph_similarity: f64,
    /// Mismatched-glyph fraction above which a text block fails
    /// (default: `0.30`).
    pub mismatch_fraction: f64,
    /// Cosine similarity below which a photograph misses the brand tone
    /// (default: `0.22`).
    pub vibe_similarity: f64,
    /// Blur score below which a photograph counts as out of focus
    /// (default: `35.0`).
    pub min_sharpness: f64,
    /// Flatness score above which a photograph counts as featureless
    /// (default: `0.88`).
    pub max_flatness: f64,
    /// Classifier confidence below which a region stays unrouted
    /// (default: `0.3`).
    pub classifier_min_confidence: f32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let keypoints = KeypointConfig::default();
        Self {
            max_concurrent_pages: 4,
            match_ratio: keypoints.match_ratio,
            min_inliers: keypoints.min_inliers,
            residual_tolerance: keypoints.residual_tolerance,
            aspect_ratio_tolerance: DEFAULT_ASPECT_RATIO_TOLERANCE,
            logo_color_tolerance: DEFAULT_COLOR_FIDELITY_TOLERANCE,
            palette_tolerance: DEFAULT_PALETTE_TOLERANCE,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            glyph_similarity: DEFAULT_GLYPH_SIMILARITY,
            mismatch_fraction: DEFAULT_MISMATCH_FRACTION,
            vibe_similarity: DEFAULT_VIBE_SIMILARITY,
            min_sharpness: DEFAULT_MIN_SHARPNESS,
            max_flatness: DEFAULT_MAX_FLATNESS,
            classifier_min_confidence: 0.3,
        }
    }
}

impl AuditConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default |
    /// |-------------------------------------|---------|
    /// | `ONBRAND_MAX_CONCURRENT_PAGES`      | `4`     |
    /// | `ONBRAND_MATCH_RATIO`               | `0.75`  |
    /// | `ONBRAND_MIN_INLIERS`               | `8`     |
    /// | `ONBRAND_RESIDUAL_TOLERANCE`        | `3.0`   |
    /// | `ONBRAND_ASPECT_RATIO_TOLERANCE`    | `0.20`  |
    /// | `ONBRAND_LOGO_COLOR_TOLERANCE`      | `30.0`  |
    /// | `ONBRAND_PALETTE_TOLERANCE`         | `24.0`  |
    /// | `ONBRAND_SAMPLE_STRIDE`             | `8`     |
    /// | `ONBRAND_GLYPH_SIMILARITY`          | `0.75`  |
    /// | `ONBRAND_MISMATCH_FRACTION`         | `0.30`  |
    /// | `ONBRAND_VIBE_SIMILARITY`           | `0.22`  |
    /// | `ONBRAND_MIN_SHARPNESS`             | `35.0`  |
    /// | `ONBRAND_MAX_FLATNESS`              | `0.88`  |
    /// | `ONBRAND_CLASSIFIER_MIN_CONFIDENCE` | `0.3`   |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_concurrent_pages: usize = std::env::var("ONBRAND_MAX_CONCURRENT_PAGES")
            .unwrap_or_else(|_| defaults.max_concurrent_pages.to_string())
            .parse()
            .expect("ONBRAND_MAX_CONCURRENT_PAGES must be a valid usize");

        let match_ratio: f64 = std::env::var("ONBRAND_MATCH_RATIO")
            .unwrap_or_else(|_| defaults.match_ratio.to_string())
            .parse()
            .expect("ONBRAND_MATCH_RATIO must be a valid f64");

        let min_inliers: usize = std::env::var("ONBRAND_MIN_INLIERS")
            .unwrap_or_else(|_| defaults.min_inliers.to_string())
            .parse()
            .expect("ONBRAND_MIN_INLIERS must be a valid usize");

        let residual_tolerance: f64 = std::env::var("ONBRAND_RESIDUAL_TOLERANCE")
            .unwrap_or_else(|_| defaults.residual_tolerance.to_string())
            .parse()
            .expect("ONBRAND_RESIDUAL_TOLERANCE must be a valid f64");

        let aspect_ratio_tolerance: f64 = std::env::var("ONBRAND_ASPECT_RATIO_TOLERANCE")
            .unwrap_or_else(|_| defaults.aspect_ratio_tolerance.to_string())
            .parse()
            .expect("ONBRAND_ASPECT_RATIO_TOLERANCE must be a valid f64");

        let logo_color_tolerance: f64 = std::env::var("ONBRAND_LOGO_COLOR_TOLERANCE")
            .unwrap_or_else(|_| defaults.logo_color_tolerance.to_string())
            .parse()
            .expect("ONBRAND_LOGO_COLOR_TOLERANCE must be a valid f64");

        let palette_tolerance: f64 = std::env::var("ONBRAND_PALETTE_TOLERANCE")
            .unwrap_or_else(|_| defaults.palette_tolerance.to_string())
            .parse()
            .expect("ONBRAND_PALETTE_TOLERANCE must be a valid f64");

        let sample_stride: u32 = std::env::var("ONBRAND_SAMPLE_STRIDE")
            .unwrap_or_else(|_| defaults.sample_stride.to_string())
            .parse()
            .expect("ONBRAND_SAMPLE_STRIDE must be a valid u32");

        let glyph_similarity: f64 = std::env::var("ONBRAND_GLYPH_SIMILARITY")
            .unwrap_or_else(|_| defaults.glyph_similarity.to_string())
            .parse()
            .expect("ONBRAND_GLYPH_SIMILARITY must be a valid f64");

        let mismatch_fraction: f64 = std::env::var("ONBRAND_MISMATCH_FRACTION")
            .unwrap_or_else(|_| defaults.mismatch_fraction.to_string())
            .parse()
            .expect("ONBRAND_MISMATCH_FRACTION must be a valid f64");

        let vibe_similarity: f64 = std::env::var("ONBRAND_VIBE_SIMILARITY")
            .unwrap_or_else(|_| defaults.vibe_similarity.to_string())
            .parse()
            .expect("ONBRAND_VIBE_SIMILARITY must be a valid f64");

        let min_sharpness: f64 = std::env::var("ONBRAND_MIN_SHARPNESS")
            .unwrap_or_else(|_| defaults.min_sharpness.to_string())
            .parse()
            .expect("ONBRAND_MIN_SHARPNESS must be a valid f64");

        let max_flatness: f64 = std::env::var("ONBRAND_MAX_FLATNESS")
            .unwrap_or_else(|_| defaults.max_flatness.to_string())
            .parse()
            .expect("ONBRAND_MAX_FLATNESS must be a valid f64");

        let classifier_min_confidence: f32 = std::env::var("ONBRAND_CLASSIFIER_MIN_CONFIDENCE")
            .unwrap_or_else(|_| defaults.classifier_min_confidence.to_string())
            .parse()
            .expect("ONBRAND_CLASSIFIER_MIN_CONFIDENCE must be a valid f32");

        Self {
            max_concurrent_pages,
            match_ratio,
            min_inliers,
            residual_tolerance,
            aspect_ratio_tolerance,
            logo_color_tolerance,
            palette_tolerance,
            sample_stride,
            glyph_similarity,
            mismatch_fraction,
            vibe_similarity,
            min_sharpness,
            max_flatness,
            classifier_min_confidence,
        }
    }

    /// Keypoint tuning derived from the logo-detection fields.
    pub fn keypoint_config(&self) -> KeypointConfig {
        KeypointConfig {
            match_ratio: self.match_ratio,
            min_inliers: self.min_inliers,
            residual_tolerance: self.residual_tolerance,
            ..KeypointConfig::default()
        }
    }
}
