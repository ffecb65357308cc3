//! Photographic style and quality checks.
//!
//! Every region the classifier routed here is checked twice: its embedding
//! against the cached brand-voice anchors (tone), and the sharpness and
//! flatness heuristics (technical quality). Off-tone photos are a low
//! violation; quality failures are medium. Embedding trouble bubbles up as
//! an error so the engine can mark the page inconclusive. Object-level
//! content rules (what may appear in a photo) are out of scope.

use image::{DynamicImage, RgbImage};
use onbrand_core::inspection::{AuditCategory, InspectionResult, ViolationLevel};
use onbrand_core::quality::{blur_score, flatness_score};
use onbrand_inference::{cosine_similarity, InferenceError};
use tracing::debug;

use crate::engine::AuditContext;
use crate::input::crop_region;
use onbrand_core::geometry::BoundingBox;

/// Audit the photographic regions of a page.
pub(crate) async fn audit_regions(
    ctx: &AuditContext,
    page_number: u32,
    page: &RgbImage,
    regions: &[BoundingBox],
) -> Result<Vec<InspectionResult>, InferenceError> {
    let mut records = Vec::new();
    for region in regions {
        let Some(crop) = crop_region(page, region) else {
            continue;
        };

        let mut vibe_best = None;
        if !ctx.cache.vibe.is_empty() {
            let embedding = ctx
                .embedder
                .embed_image(&DynamicImage::ImageRgb8(crop.clone()))
                .await?;
            let best = ctx
                .cache
                .vibe
                .iter()
                .map(|anchor| cosine_similarity(&embedding, &anchor.embedding))
                .fold(f64::MIN, f64::max);
            vibe_best = Some(best);
        }

        let sharpness = blur_score(&crop);
        let flatness = flatness_score(&crop);
        debug!(
            page = page_number,
            region = ?region,
            sharpness,
            flatness,
            vibe = ?vibe_best,
            "photo region checked"
        );

        let mut failed = false;
        if let Some(best) = vibe_best {
            if best < ctx.config.vibe_similarity {
                failed = true;
                records.push(
                    InspectionResult::fail(
                        AuditCategory::Imagery,
                        ViolationLevel::Low,
                        page_number,
                        format!("Photo does not match the brand tone (best vibe similarity {best:.2})"),
                    )
                    .with_region(*region),
                );
            }
        }
        let quality_problem = if sharpness < ctx.config.min_sharpness {
            Some(format!(
                "sharpness {sharpness:.1} below {:.1}",
                ctx.config.min_sharpness
            ))
        } else if flatness > ctx.config.max_flatness {
            Some(format!(
                "flatness {flatness:.2} above {:.2}",
                ctx.config.max_flatness
            ))
        } else {
            None
        };
        if let Some(problem) = quality_problem {
            failed = true;
            records.push(
                InspectionResult::fail(
                    AuditCategory::Imagery,
                    ViolationLevel::Medium,
                    page_number,
                    format!("Photo fails quality heuristics ({problem})"),
                )
                .with_region(*region),
            );
        }
        if !failed {
            records.push(
                InspectionResult::pass(
                    AuditCategory::Imagery,
                    page_number,
                    "Photo matches the brand tone and quality bar",
                )
                .with_region(*region),
            );
        }
    }
    Ok(records)
}
