//! Typeface conformance checks.
//!
//! Each renderer-supplied text block is sliced into glyph crops by column
//! projection, every glyph is embedded and compared against the cached
//! specimen embeddings, and the per-glyph matches roll up into a block
//! verdict. A failing block is critical when the block reads as a
//! forbidden typeface, medium otherwise. Typefaces without specimens are
//! invisible here; the engine surfaces them as reference-missing notes.

use image::{DynamicImage, RgbImage};
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::color::Rgb;
use onbrand_core::inspection::{
    AuditCategory, DataQualityNote, InspectionResult, NoteKind, ViolationLevel,
};
use onbrand_core::typography::{block_verdict, GlyphMatch};
use onbrand_inference::cosine_similarity;
use tracing::{error, warn};

use crate::cache::FontReference;
use crate::engine::AuditContext;
use crate::input::{crop_region, TextBlock};

/// Luminance below which a pixel counts as ink.
const INK_LUMINANCE: f64 = 128.0;

/// Narrower ink runs are specks, not glyphs.
const MIN_GLYPH_WIDTH: u32 = 2;

/// One reference-missing note per typeface the audit cannot check.
pub(crate) fn reference_notes(kit: &BrandKit) -> Vec<DataQualityNote> {
    kit.typography
        .iter()
        .filter(|f| !f.has_reference)
        .map(|f| {
            DataQualityNote::new(
                NoteKind::ReferenceMissing,
                f.family.clone(),
                "no glyph specimen registered; typeface skipped by typography checks",
            )
        })
        .collect()
}

/// Audit every text block on a page.
pub(crate) async fn audit_page(
    ctx: &AuditContext,
    page_number: u32,
    page: &RgbImage,
    blocks: &[TextBlock],
) -> Vec<InspectionResult> {
    if ctx.cache.fonts.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut checked = 0usize;

    'blocks: for block in blocks {
        let Some(crop) = crop_region(page, &block.region) else {
            continue;
        };
        let glyphs = slice_glyphs(&crop);
        if glyphs.is_empty() {
            continue;
        }

        let mut matches = Vec::with_capacity(glyphs.len());
        for glyph in &glyphs {
            let embedding = match ctx
                .embedder
                .embed_image(&DynamicImage::ImageRgb8(glyph.clone()))
                .await
            {
                Ok(embedding) => embedding,
                Err(e) => {
                    error!(page = page_number, error = %e, "glyph embedding failed");
                    records.push(
                        InspectionResult::inconclusive(
                            AuditCategory::Typography,
                            page_number,
                            format!("Typography check could not run: {e}"),
                        )
                        .with_region(block.region),
                    );
                    continue 'blocks;
                }
            };
            if let Some(m) =
                best_font_match(&ctx.cache.fonts, &embedding, ctx.config.glyph_similarity)
            {
                matches.push(m);
            }
        }

        checked += 1;
        let verdict = block_verdict(&matches, ctx.config.mismatch_fraction);
        if verdict.failing {
            let (level, forbidden) = block_severity(ctx, &crop).await;
            let message = match forbidden {
                Some(label) => format!(
                    "Text block appears to be set in forbidden typeface '{}' ({}/{} glyphs mismatched)",
                    label, verdict.mismatched, verdict.glyphs
                ),
                None => format!(
                    "Text block does not match any registered typeface ({}/{} glyphs mismatched)",
                    verdict.mismatched, verdict.glyphs
                ),
            };
            records.push(
                InspectionResult::fail(AuditCategory::Typography, level, page_number, message)
                    .with_region(block.region),
            );
        }
    }

    if records.is_empty() && checked > 0 {
        records.push(InspectionResult::pass(
            AuditCategory::Typography,
            page_number,
            "Text is set in registered typefaces",
        ));
    }
    records
}

/// Nearest registered typeface for one glyph embedding.
fn best_font_match(
    fonts: &[FontReference],
    embedding: &[f32],
    glyph_similarity: f64,
) -> Option<GlyphMatch> {
    fonts
        .iter()
        .enumerate()
        .map(|(i, f)| (i, cosine_similarity(embedding, &f.embedding)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, similarity)| GlyphMatch::scored(i, similarity, glyph_similarity))
}

/// Failing blocks escalate to critical when the whole block reads as a
/// forbidden typeface. Classifier trouble downgrades to medium rather
/// than blocking the record.
async fn block_severity(ctx: &AuditContext, crop: &RgbImage) -> (ViolationLevel, Option<String>) {
    let mut labels: Vec<String> = ctx.cache.fonts.iter().map(|f| f.family.clone()).collect();
    labels.extend(ctx.kit.brand_voice.forbidden_keywords.iter().cloned());
    if labels.is_empty() {
        return (ViolationLevel::Medium, None);
    }
    match ctx
        .classifier
        .classify(&DynamicImage::ImageRgb8(crop.clone()), &labels)
        .await
    {
        Ok(winner) if ctx.kit.brand_voice.is_forbidden(&winner.label) => {
            (ViolationLevel::Critical, Some(winner.label))
        }
        Ok(_) => (ViolationLevel::Medium, None),
        Err(e) => {
            warn!(error = %e, "block severity classification failed");
            (ViolationLevel::Medium, None)
        }
    }
}

/// Split a block crop into per-glyph crops by column projection: runs of
/// columns containing ink, separated by background gaps.
pub(crate) fn slice_glyphs(block: &RgbImage) -> Vec<RgbImage> {
    let (w, h) = block.dimensions();
    let mut ink = vec![false; w as usize];
    for x in 0..w {
        for y in 0..h {
            let p = block.get_pixel(x, y);
            if Rgb::new(p.0[0], p.0[1], p.0[2]).luminance() < INK_LUMINANCE {
                ink[x as usize] = true;
                break;
            }
        }
    }

    let mut glyphs = Vec::new();
    let mut start: Option<u32> = None;
    for x in 0..=w {
        let is_ink = x < w && ink[x as usize];
        match (start, is_ink) {
            (None, true) => start = Some(x),
            (Some(s), false) => {
                let width = x - s;
                if width >= MIN_GLYPH_WIDTH {
                    glyphs.push(image::imageops::crop_imm(block, s, 0, width, h).to_image());
                }
                start = None;
            }
            _ => {}
        }
    }
    glyphs
}
