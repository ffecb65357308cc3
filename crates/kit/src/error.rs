//! Ingestion errors.

use onbrand_core::error::CoreError;
use onbrand_inference::InferenceError;

/// Fatal ingestion failures. Anything recoverable becomes a
/// data-quality warning instead.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A source file is structurally unusable (no pages, undecodable page,
    /// region outside its page). Nothing partial is returned.
    #[error("Malformed document '{name}': {reason}")]
    MalformedDocument { name: String, reason: String },

    /// The guideline extraction call failed at the transport level.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The assembled kit failed structural validation.
    #[error(transparent)]
    Core(#[from] CoreError),
}
