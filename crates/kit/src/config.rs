//! Ingestion configuration.

use onbrand_core::color::{DEFAULT_KMEANS_K, SWATCH_DEDUP_DISTANCE};

/// Ingestion tuning loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Concurrent region-classification tasks (default: `4`).
    pub max_concurrent: usize,
    /// Classifier confidence below which a region stays `Unknown`
    /// (default: `0.3`).
    pub classifier_min_confidence: f32,
    /// Euclidean distance under which two swatches are duplicates
    /// (default: `10.0`).
    pub swatch_dedup_distance: f64,
    /// Cluster count for the dominant-color fallback (default: `5`).
    pub kmeans_k: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            classifier_min_confidence: 0.3,
            swatch_dedup_distance: SWATCH_DEDUP_DISTANCE,
            kmeans_k: DEFAULT_KMEANS_K,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default |
    /// |------------------------------------|---------|
    /// | `ONBRAND_INGEST_MAX_CONCURRENT`    | `4`     |
    /// | `ONBRAND_CLASSIFIER_MIN_CONFIDENCE`| `0.3`   |
    /// | `ONBRAND_SWATCH_DEDUP_DISTANCE`    | `10.0`  |
    /// | `ONBRAND_KMEANS_K`                 | `5`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_concurrent: usize = std::env::var("ONBRAND_INGEST_MAX_CONCURRENT")
            .unwrap_or_else(|_| defaults.max_concurrent.to_string())
            .parse()
            .expect("ONBRAND_INGEST_MAX_CONCURRENT must be a valid usize");

        let classifier_min_confidence: f32 = std::env::var("ONBRAND_CLASSIFIER_MIN_CONFIDENCE")
            .unwrap_or_else(|_| defaults.classifier_min_confidence.to_string())
            .parse()
            .expect("ONBRAND_CLASSIFIER_MIN_CONFIDENCE must be a valid f32");

        let swatch_dedup_distance: f64 = std::env::var("ONBRAND_SWATCH_DEDUP_DISTANCE")
            .unwrap_or_else(|_| defaults.swatch_dedup_distance.to_string())
            .parse()
            .expect("ONBRAND_SWATCH_DEDUP_DISTANCE must be a valid f64");

        let kmeans_k: usize = std::env::var("ONBRAND_KMEANS_K")
            .unwrap_or_else(|_| defaults.kmeans_k.to_string())
            .parse()
            .expect("ONBRAND_KMEANS_K must be a valid usize");

        Self {
            max_concurrent,
            classifier_min_confidence,
            swatch_dedup_distance,
            kmeans_k,
        }
    }
}
