//! Per-block typography verdict math.
//!
//! The typography auditor compares each glyph in a rendered text block
//! against the registered typefaces and gets back one [`GlyphMatch`] per
//! glyph. This module turns those per-glyph calls into a block-level
//! verdict. The threshold logic lives here, away from embeddings and IO,
//! so the boundary cases are trivially testable.

use serde::{Deserialize, Serialize};

/// Cosine similarity below which a glyph does not look like any registered
/// typeface.
pub const DEFAULT_GLYPH_SIMILARITY: f64 = 0.75;

/// Fraction of mismatched glyphs a block tolerates. Strictly above fails.
pub const DEFAULT_MISMATCH_FRACTION: f64 = 0.30;

/// One glyph scored against the closest registered typeface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphMatch {
    /// Index of the best-matching registered font spec.
    pub font_index: usize,
    /// Cosine similarity to that font's reference embedding.
    pub similarity: f64,
    /// Below the glyph-similarity threshold.
    pub mismatched: bool,
}

impl GlyphMatch {
    pub fn scored(font_index: usize, similarity: f64, glyph_similarity: f64) -> Self {
        Self {
            font_index,
            similarity,
            mismatched: similarity < glyph_similarity,
        }
    }
}

/// Majority-vote outcome for a text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockVerdict {
    pub glyphs: usize,
    pub mismatched: usize,
    pub mismatched_fraction: f64,
    pub failing: bool,
}

/// Aggregate per-glyph matches into a block verdict.
///
/// A block fails only when its mismatched fraction is strictly greater
/// than `mismatch_fraction`; a block sitting exactly on the threshold
/// passes. Empty blocks pass vacuously.
pub fn block_verdict(per_glyph: &[GlyphMatch], mismatch_fraction: f64) -> BlockVerdict {
    let glyphs = per_glyph.len();
    let mismatched = per_glyph.iter().filter(|g| g.mismatched).count();
    let fraction = if glyphs == 0 {
        0.0
    } else {
        mismatched as f64 / glyphs as f64
    };
    BlockVerdict {
        glyphs,
        mismatched,
        mismatched_fraction: fraction,
        failing: fraction > mismatch_fraction,
    }
}
