//! Audit error types.

use onbrand_core::error::CoreError;
use onbrand_inference::InferenceError;
use thiserror::Error;

/// Fatal audit failures. Per-page and per-category problems never show up
/// here; they degrade to inconclusive records inside the report.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Malformed document {name}: {reason}")]
    MalformedDocument { name: String, reason: String },

    #[error("Audit cancelled")]
    Cancelled,

    /// A page task panicked or was torn down unexpectedly.
    #[error("Page task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
