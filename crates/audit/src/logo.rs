//! Logo usage checks.
//!
//! For every registered variant the page is searched with keypoint
//! matching; absence produces no record since not using a logo is not
//! misuse. A located variant is then held against the reference shape
//! and color: aspect ratio within tolerance, and the mean color of the
//! located region close to the reference's dominant color. Clear-space
//! margins and rotation detection are out of scope.

use image::RgbImage;
use onbrand_core::color::{mean_color, perceptual_distance, Rgb};
use onbrand_core::geometry::{ratio_within_tolerance, BoundingBox};
use onbrand_core::inspection::{AuditCategory, InspectionResult, ViolationLevel};
use onbrand_core::keypoints::{detect_features, locate, match_and_fit};
use tracing::debug;

use crate::cache::{LogoReference, ReferenceCache};
use crate::config::AuditConfig;

/// Outcome of the tolerance checks on a located variant.
struct MatchChecks {
    ratio_ok: bool,
    color_ok: bool,
}

/// Audit one page against every cached logo variant.
pub(crate) fn audit_page(
    page_number: u32,
    page: &RgbImage,
    cache: &ReferenceCache,
    config: &AuditConfig,
) -> Vec<InspectionResult> {
    if cache.logos.is_empty() {
        return Vec::new();
    }
    let keypoint_config = config.keypoint_config();
    let scene = detect_features(page, &keypoint_config);
    if scene.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    for reference in &cache.logos {
        let Some(fit) = match_and_fit(&reference.features, &scene, &keypoint_config) else {
            continue;
        };
        let located = locate(reference.dimensions, &fit.transform);
        debug!(
            page = page_number,
            asset_id = %reference.asset_id,
            inliers = fit.inliers,
            matches = fit.matches,
            region = ?located,
            "logo variant located"
        );

        let (w, h) = page.dimensions();
        let region_mean = located
            .clamp_to(w, h)
            .and_then(|clamped| mean_of_region(page, &clamped));
        let checks = evaluate(reference, &located, region_mean, config);

        let record = if checks.ratio_ok && checks.color_ok {
            InspectionResult::pass(
                AuditCategory::Logo,
                page_number,
                format!("Logo variant {} used within tolerances", reference.asset_id),
            )
        } else {
            let mut problems = Vec::new();
            if !checks.ratio_ok {
                problems.push("aspect ratio outside tolerance");
            }
            if !checks.color_ok {
                problems.push("colors deviating from the reference");
            }
            InspectionResult::fail(
                AuditCategory::Logo,
                ViolationLevel::Medium,
                page_number,
                format!(
                    "Logo variant {} found with {}",
                    reference.asset_id,
                    problems.join(" and ")
                ),
            )
        };
        records.push(record.with_region(located));
    }
    records
}

/// Tolerance checks on a located variant. The unclamped box carries the
/// detected shape; color comparison uses whatever of it lies on the page.
fn evaluate(
    reference: &LogoReference,
    located: &BoundingBox,
    region_mean: Option<Rgb>,
    config: &AuditConfig,
) -> MatchChecks {
    let ratio_ok = match (located.aspect_ratio(), reference.aspect_ratio) {
        (Some(detected), Some(expected)) => {
            ratio_within_tolerance(detected, expected, config.aspect_ratio_tolerance)
        }
        _ => false,
    };
    let color_ok = match (region_mean, reference.dominant.first()) {
        (Some(mean), Some(&dominant)) => {
            perceptual_distance(mean, dominant) <= config.logo_color_tolerance
        }
        // No pixels or no reference color to compare against.
        _ => true,
    };
    MatchChecks { ratio_ok, color_ok }
}

fn mean_of_region(image: &RgbImage, region: &BoundingBox) -> Option<Rgb> {
    let pixels: Vec<Rgb> = (region.y..region.y + region.height)
        .flat_map(|y| {
            (region.x..region.x + region.width)
                .map(move |x| image.get_pixel(x as u32, y as u32))
                .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
        })
        .collect();
    mean_color(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use onbrand_core::keypoints::KeypointConfig;

    fn reference(aspect: Option<f64>, dominant: Vec<Rgb>) -> LogoReference {
        LogoReference {
            asset_id: uuid::Uuid::new_v4(),
            features: Vec::new(),
            dominant,
            aspect_ratio: aspect,
            dimensions: (60, 60),
        }
    }

    fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let bx = x / 4;
            let by = y / 4;
            let h = bx
                .wrapping_mul(73)
                .wrapping_add(by.wrapping_mul(151))
                .wrapping_add(seed.wrapping_mul(97));
            let v = ((h.wrapping_mul(2654435761)) >> 26) as u8;
            image::Rgb([v, v.wrapping_add(24), v.wrapping_add(48)])
        })
    }

    // -- tolerance checks -----------------------------------------------------

    #[test]
    fn stretch_of_twenty_percent_passes_ratio_check() {
        let r = reference(Some(1.0), vec![]);
        let located = BoundingBox::new(0, 0, 72, 60);
        let checks = evaluate(&r, &located, None, &AuditConfig::default());
        assert!(checks.ratio_ok);
    }

    #[test]
    fn stretch_of_fifty_percent_fails_ratio_check() {
        let r = reference(Some(1.0), vec![]);
        let located = BoundingBox::new(0, 0, 90, 60);
        let checks = evaluate(&r, &located, None, &AuditConfig::default());
        assert!(!checks.ratio_ok);
    }

    #[test]
    fn exact_color_passes_and_recolor_fails() {
        let brand = Rgb::new(0x11, 0x22, 0x33);
        let r = reference(Some(1.0), vec![brand]);
        let located = BoundingBox::new(0, 0, 60, 60);

        let same = evaluate(&r, &located, Some(brand), &AuditConfig::default());
        assert!(same.color_ok);

        let recolored = evaluate(
            &r,
            &located,
            Some(Rgb::new(0x99, 0x88, 0x77)),
            &AuditConfig::default(),
        );
        assert!(!recolored.color_ok);
    }

    #[test]
    fn missing_reference_color_skips_the_color_check() {
        let r = reference(Some(1.0), vec![]);
        let located = BoundingBox::new(0, 0, 60, 60);
        let checks = evaluate(&r, &located, Some(Rgb::new(1, 2, 3)), &AuditConfig::default());
        assert!(checks.color_ok);
    }

    #[test]
    fn degenerate_located_box_fails_ratio_check() {
        let r = reference(Some(1.0), vec![]);
        let located = BoundingBox::new(0, 0, 0, 60);
        let checks = evaluate(&r, &located, None, &AuditConfig::default());
        assert!(!checks.ratio_ok);
    }

    // -- pixel path -----------------------------------------------------------

    /// A reference pasted 1:1 onto a page yields exactly one passing
    /// record whose region is the paste location.
    #[test]
    fn pasted_variant_passes_at_original_scale() {
        let crop = noise_image(64, 64, 5);
        let mut page = RgbImage::from_pixel(220, 160, image::Rgb([255, 255, 255]));
        image::imageops::replace(&mut page, &crop, 60, 40);

        let keypoint_config = KeypointConfig::default();
        let features = detect_features(&crop, &keypoint_config);
        assert!(features.len() >= keypoint_config.min_inliers);

        let pixels: Vec<Rgb> = crop.pixels().map(|p| Rgb::new(p.0[0], p.0[1], p.0[2])).collect();
        let cache = ReferenceCache {
            logos: vec![LogoReference {
                asset_id: uuid::Uuid::new_v4(),
                features,
                dominant: vec![mean_color(&pixels).unwrap()],
                aspect_ratio: Some(1.0),
                dimensions: (64, 64),
            }],
            fonts: Vec::new(),
            vibe: Vec::new(),
        };

        let records = audit_page(1, &page, &cache, &AuditConfig::default());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.status, onbrand_core::inspection::CheckStatus::Pass);
        let region = record.region.unwrap();
        assert!((region.x - 60).abs() <= 2, "x = {}", region.x);
        assert!((region.y - 40).abs() <= 2, "y = {}", region.y);
    }

    /// A page without the variant produces no records at all.
    #[test]
    fn absent_variant_is_not_reported() {
        let crop = noise_image(64, 64, 5);
        let keypoint_config = KeypointConfig::default();
        let cache = ReferenceCache {
            logos: vec![LogoReference {
                asset_id: uuid::Uuid::new_v4(),
                features: detect_features(&crop, &keypoint_config),
                dominant: Vec::new(),
                aspect_ratio: Some(1.0),
                dimensions: (64, 64),
            }],
            fonts: Vec::new(),
            vibe: Vec::new(),
        };

        // Checkerboard corners all have phase twins, so the ratio test
        // rejects every candidate match as ambiguous.
        let page = RgbImage::from_fn(220, 160, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let records = audit_page(1, &page, &cache, &AuditConfig::default());
        assert!(records.is_empty());
    }
}
