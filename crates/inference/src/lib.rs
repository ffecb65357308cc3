//! Clients for the model-inference sidecar.
//!
//! Provides the provider traits the ingestion and audit pipelines depend
//! on (zero-shot classification, image/text embedding, guideline text
//! extraction), an HTTP implementation against the inference service, and
//! embedding-space math shared by the consumers.

pub mod error;
pub mod http;
pub mod provider;
pub mod similarity;

pub use error::InferenceError;
pub use http::HttpInference;
pub use provider::{Classifier, Embedder, GuidelineModel, LabelScore};
pub use similarity::cosine_similarity;
