//! SHA-256 hex digests for content fingerprints.
//!
//! Source file references and assets carry a digest of their raw bytes so
//! that rebuilding a kit over unchanged inputs yields identical
//! fingerprints even though generated ids differ.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}
