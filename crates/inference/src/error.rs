//! Errors from the inference service layer.

/// Errors crossing the inference HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Inference service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx but the payload was not what the contract
    /// promises.
    #[error("Malformed inference response: {0}")]
    Decode(String),

    /// An image could not be PNG-encoded for upload.
    #[error("Image encode failed: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_body() {
        let err = InferenceError::Api {
            status: 503,
            body: "model loading".into(),
        };
        assert_eq!(
            err.to_string(),
            "Inference service error (503): model loading"
        );
    }

    #[test]
    fn decode_error_displays_reason() {
        let err = InferenceError::Decode("scores array missing".into());
        assert!(err.to_string().contains("scores array missing"));
    }
}
