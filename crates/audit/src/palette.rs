//! Palette conformance checks.
//!
//! Background and layout colors are grid-sampled (figure regions
//! excluded), bucketed, and each significant bucket is measured against
//! the registered palette. Distance within tolerance contributes to a
//! per-page pass; up to twice the tolerance is a low violation, beyond
//! that a medium one. An empty palette means nothing to check and no
//! records at all.

use image::RgbImage;
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::color::{nearest_swatch, Rgb, PALETTE_MARGINAL_FACTOR};
use onbrand_core::geometry::BoundingBox;
use onbrand_core::inspection::{AuditCategory, InspectionResult, ViolationLevel};
use onbrand_core::sampling::{bucket_colors, grid_sample, DEFAULT_BUCKET_SIZE};

use crate::config::AuditConfig;

/// A palette entry with its display hex kept for report messages.
#[derive(Debug, Clone)]
pub(crate) struct PaletteEntry {
    pub rgb: Rgb,
    pub hex: String,
}

/// Parse the kit palette once per audit. Unparseable entries are dropped;
/// kit validation reports those through its own channel.
pub(crate) fn parse_palette(kit: &BrandKit) -> Vec<PaletteEntry> {
    kit.colors
        .iter()
        .filter_map(|swatch| {
            swatch.rgb().ok().map(|rgb| PaletteEntry {
                rgb,
                hex: swatch.hex.clone(),
            })
        })
        .collect()
}

/// Audit one page's sampled colors against the palette.
pub(crate) fn audit_page(
    page_number: u32,
    page: &RgbImage,
    exclusions: &[BoundingBox],
    palette: &[PaletteEntry],
    config: &AuditConfig,
) -> Vec<InspectionResult> {
    if palette.is_empty() {
        return Vec::new();
    }
    let samples = grid_sample(page, config.sample_stride, exclusions);
    if samples.is_empty() {
        return Vec::new();
    }
    let swatches: Vec<Rgb> = palette.iter().map(|p| p.rgb).collect();

    let mut records = Vec::new();
    for bucket in bucket_colors(&samples, DEFAULT_BUCKET_SIZE) {
        // Palette is non-empty, so a nearest entry always exists.
        let Some((index, distance)) = nearest_swatch(bucket.rgb, &swatches) else {
            continue;
        };
        if let Some(level) = severity_for_distance(distance, config.palette_tolerance) {
            records.push(InspectionResult::fail(
                AuditCategory::Palette,
                level,
                page_number,
                format!(
                    "Off-palette color {} across {} samples (nearest brand color {} at distance {:.1})",
                    bucket.rgb.to_hex(),
                    bucket.count,
                    palette[index].hex,
                    distance
                ),
            ));
        }
    }

    if records.is_empty() {
        records.push(InspectionResult::pass(
            AuditCategory::Palette,
            page_number,
            "Sampled colors stay within the brand palette",
        ));
    }
    records
}

/// Map a perceptual distance to a violation level, `None` when the color
/// is close enough to pass.
fn severity_for_distance(distance: f64, tolerance: f64) -> Option<ViolationLevel> {
    if distance <= tolerance {
        None
    } else if distance <= tolerance * PALETTE_MARGINAL_FACTOR {
        Some(ViolationLevel::Low)
    } else {
        Some(ViolationLevel::Medium)
    }
}
