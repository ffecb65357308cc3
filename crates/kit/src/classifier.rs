//! Region-to-category classification.

use std::sync::Arc;

use image::DynamicImage;
use onbrand_core::asset::{AssetCategory, CLASSIFIABLE};
use onbrand_inference::{Classifier, InferenceError};
use tracing::debug;

/// Zero-shot labeling of region crops.
///
/// Wraps a [`Classifier`] provider with the category label set and the
/// confidence floor. Below the floor a region is `Unknown`; the pipeline
/// never forces a guess into the reference set.
#[derive(Clone)]
pub struct AssetClassifier {
    provider: Arc<dyn Classifier>,
    min_confidence: f32,
}

impl AssetClassifier {
    pub fn new(provider: Arc<dyn Classifier>, min_confidence: f32) -> Self {
        Self {
            provider,
            min_confidence,
        }
    }

    /// The candidate label text for each classifiable category.
    pub fn category_labels() -> Vec<String> {
        CLASSIFIABLE
            .iter()
            .map(|c| c.descriptor_text().to_string())
            .collect()
    }

    /// Classify one region crop. Returns the category and the winning
    /// score; low-confidence and unrecognized labels map to `Unknown`.
    pub async fn classify_region(
        &self,
        crop: &DynamicImage,
    ) -> Result<(AssetCategory, f32), InferenceError> {
        let labels = Self::category_labels();
        let winner = self.provider.classify(crop, &labels).await?;

        let category =
            AssetCategory::from_descriptor(&winner.label).unwrap_or(AssetCategory::Unknown);

        if winner.score < self.min_confidence {
            debug!(
                label = %winner.label,
                score = winner.score,
                "classification below confidence floor"
            );
            return Ok((AssetCategory::Unknown, winner.score));
        }
        Ok((category, winner.score))
    }
}
