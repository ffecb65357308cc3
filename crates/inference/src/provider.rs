//! Provider traits for model inference.
//!
//! Ingestion and audit code depend on these traits, never on the HTTP
//! client directly; tests swap in scripted stubs.

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// A label with its zero-shot score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    /// Normalized confidence in `[0, 1]`.
    pub score: f32,
}

/// The highest-scoring entry, ties resolved toward the earlier label.
pub fn best_label(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores
        .iter()
        .reduce(|best, s| if s.score > best.score { s } else { best })
}

/// Zero-shot image classification over caller-supplied labels.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Score an image against the candidate labels and return the winner.
    async fn classify(
        &self,
        image: &DynamicImage,
        labels: &[String],
    ) -> Result<LabelScore, InferenceError>;
}

/// Shared-space image and text embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError>;

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, InferenceError>;
}

/// Structured extraction over guideline text.
#[async_trait]
pub trait GuidelineModel: Send + Sync {
    /// Run an extraction prompt against document text. The system prompt
    /// requests JSON output; the raw completion comes back for tolerant
    /// parsing on the caller's side.
    async fn extract(&self, system: &str, prompt: &str) -> Result<String, InferenceError>;
}
