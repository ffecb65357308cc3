//! HTTP implementation of the provider traits.
//!
//! Talks to the inference sidecar over four endpoints: `POST /classify`,
//! `POST /embed/image`, `POST /embed/text`, and `POST /extract`. Images
//! are PNG-encoded and base64'd into the JSON payload.

use std::io::Cursor;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use serde::Deserialize;
use tracing::debug;

use crate::error::InferenceError;
use crate::provider::{best_label, Classifier, Embedder, GuidelineModel, LabelScore};

/// HTTP client for a single inference service instance.
pub struct HttpInference {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    scores: Vec<LabelScore>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: String,
}

impl HttpInference {
    /// Create a client for an inference service.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:9090`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`] (connection
    /// pooling across services).
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or an [`InferenceError::Api`] with the status
    /// and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, InferenceError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// PNG-encode and base64 an image for a JSON payload.
fn png_base64(image: &DynamicImage) -> Result<String, InferenceError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| InferenceError::Encode(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

/// The service must answer with one score per candidate label.
fn validate_scores(
    scores: Vec<LabelScore>,
    labels: &[String],
) -> Result<Vec<LabelScore>, InferenceError> {
    if scores.len() != labels.len() {
        return Err(InferenceError::Decode(format!(
            "expected {} scores, got {}",
            labels.len(),
            scores.len()
        )));
    }
    Ok(scores)
}

/// Empty embeddings are a service bug, not a usable vector.
fn validate_embedding(embedding: Vec<f32>) -> Result<Vec<f32>, InferenceError> {
    if embedding.is_empty() {
        return Err(InferenceError::Decode("empty embedding".into()));
    }
    Ok(embedding)
}

#[async_trait]
impl Classifier for HttpInference {
    async fn classify(
        &self,
        image: &DynamicImage,
        labels: &[String],
    ) -> Result<LabelScore, InferenceError> {
        debug!(labels = labels.len(), "classify request");
        let body = serde_json::json!({
            "image": png_base64(image)?,
            "labels": labels,
        });

        let response = self
            .client
            .post(format!("{}/classify", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: ClassifyResponse = Self::parse_response(response).await?;
        let scores = validate_scores(parsed.scores, labels)?;
        best_label(&scores)
            .cloned()
            .ok_or_else(|| InferenceError::Decode("no scores returned".into()))
    }
}

#[async_trait]
impl Embedder for HttpInference {
    async fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        let body = serde_json::json!({ "image": png_base64(image)? });

        let response = self
            .client
            .post(format!("{}/embed/image", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: EmbeddingResponse = Self::parse_response(response).await?;
        validate_embedding(parsed.embedding)
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let body = serde_json::json!({ "text": text });

        let response = self
            .client
            .post(format!("{}/embed/text", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: EmbeddingResponse = Self::parse_response(response).await?;
        validate_embedding(parsed.embedding)
    }
}

#[async_trait]
impl GuidelineModel for HttpInference {
    async fn extract(&self, system: &str, prompt: &str) -> Result<String, InferenceError> {
        debug!(chars = prompt.len(), "extraction request");
        let body = serde_json::json!({
            "system": system,
            "prompt": prompt,
            "format": "json",
        });

        let response = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&body)
            .send()
            .await?;

        let parsed: ExtractResponse = Self::parse_response(response).await?;
        Ok(parsed.text)
    }
}
