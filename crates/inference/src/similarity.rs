//! Embedding-space math.

/// Cosine similarity between two embeddings.
///
/// Returns `0.0` for mismatched dimensions or zero-magnitude inputs; both
/// mean "no usable signal", and callers treat low similarity as no match
/// rather than an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut mag_a = 0.0f64;
    let mut mag_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        mag_a += *x as f64 * *x as f64;
        mag_b += *y as f64 * *y as f64;
    }
    if mag_a <= f64::EPSILON || mag_b <= f64::EPSILON {
        return 0.0;
    }
    dot / (mag_a.sqrt() * mag_b.sqrt())
}
