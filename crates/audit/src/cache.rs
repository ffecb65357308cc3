//! Precomputed per-kit reference state.
//!
//! Everything the auditors compare against is derived once per kit, up
//! front: keypoint features and dominant colors per logo variant, one
//! glyph embedding per referenced typeface, one text embedding per brand
//! voice keyword. The cache is immutable and shared by reference across
//! page tasks; it only changes when a kit is re-ingested.

use std::collections::HashMap;

use image::{DynamicImage, RgbImage};
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::color::{dominant_colors, Rgb, DEFAULT_KMEANS_K, KMEANS_MAX_ITERS};
use onbrand_core::font::normalize_family;
use onbrand_core::keypoints::{detect_features, Feature};
use onbrand_core::types::EntityId;
use onbrand_inference::Embedder;
use tracing::{debug, warn};

use crate::config::AuditConfig;
use crate::error::AuditError;

/// Raster lookups for cache construction, assembled by the caller from
/// the original source documents.
#[derive(Debug, Default)]
pub struct ReferenceImages {
    logos: HashMap<EntityId, RgbImage>,
    glyphs: HashMap<String, RgbImage>,
}

impl ReferenceImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_logo(&mut self, asset_id: EntityId, image: RgbImage) {
        self.logos.insert(asset_id, image);
    }

    pub fn add_glyphs(&mut self, family: &str, image: RgbImage) {
        self.glyphs.insert(normalize_family(family), image);
    }

    pub fn logo(&self, asset_id: &EntityId) -> Option<&RgbImage> {
        self.logos.get(asset_id)
    }

    /// Lookup by family name in any capitalization or spacing.
    pub fn glyphs(&self, family: &str) -> Option<&RgbImage> {
        self.glyphs.get(&normalize_family(family))
    }
}

/// One logo variant, ready for page matching.
#[derive(Debug, Clone)]
pub struct LogoReference {
    pub asset_id: EntityId,
    pub features: Vec<Feature>,
    /// Dominant colors of the reference crop, most common first.
    pub dominant: Vec<Rgb>,
    pub aspect_ratio: Option<f64>,
    pub dimensions: (u32, u32),
}

/// One registered typeface with its glyph-specimen embedding.
#[derive(Debug, Clone)]
pub struct FontReference {
    pub family: String,
    pub normalized: String,
    pub embedding: Vec<f32>,
}

/// One brand-voice keyword with its text embedding.
#[derive(Debug, Clone)]
pub struct VibeAnchor {
    pub keyword: String,
    pub embedding: Vec<f32>,
}

/// Immutable audit reference state for one brand kit.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    pub logos: Vec<LogoReference>,
    pub fonts: Vec<FontReference>,
    pub vibe: Vec<VibeAnchor>,
}

impl ReferenceCache {
    /// Build the cache for a kit.
    ///
    /// Logo assets or referenced fonts without a raster in `images` are
    /// skipped with a warning; the corresponding checks will simply not
    /// run. Embedding failures are fatal here since nothing has been
    /// audited yet.
    pub async fn build(
        kit: &BrandKit,
        images: &ReferenceImages,
        embedder: &dyn Embedder,
        config: &AuditConfig,
    ) -> Result<ReferenceCache, AuditError> {
        let keypoint_config = config.keypoint_config();

        let mut logos = Vec::new();
        for asset in &kit.logo_assets {
            let Some(image) = images.logo(&asset.id) else {
                warn!(asset_id = %asset.id, "no raster for logo asset, skipping variant");
                continue;
            };
            let features = detect_features(image, &keypoint_config);
            if features.is_empty() {
                warn!(asset_id = %asset.id, "logo reference has no detectable keypoints, skipping variant");
                continue;
            }
            let dominant = if asset.dominant_colors.is_empty() {
                let pixels: Vec<Rgb> = image
                    .pixels()
                    .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
                    .collect();
                dominant_colors(&pixels, DEFAULT_KMEANS_K, KMEANS_MAX_ITERS)
            } else {
                asset.dominant_colors.clone()
            };
            let (w, h) = image.dimensions();
            logos.push(LogoReference {
                asset_id: asset.id,
                features,
                dominant,
                aspect_ratio: (h > 0).then(|| w as f64 / h as f64),
                dimensions: (w, h),
            });
        }

        let mut fonts = Vec::new();
        for font in kit.referenced_fonts() {
            let normalized = font.normalized_family();
            let Some(image) = images.glyphs(&normalized) else {
                warn!(family = %font.family, "no glyph specimen raster, skipping typeface");
                continue;
            };
            let embedding = embedder
                .embed_image(&DynamicImage::ImageRgb8(image.clone()))
                .await?;
            fonts.push(FontReference {
                family: font.family.clone(),
                normalized,
                embedding,
            });
        }

        let mut vibe = Vec::new();
        for keyword in &kit.brand_voice.attributes {
            if keyword.trim().is_empty() {
                continue;
            }
            let embedding = embedder.embed_text(keyword).await?;
            vibe.push(VibeAnchor {
                keyword: keyword.clone(),
                embedding,
            });
        }

        debug!(
            logos = logos.len(),
            fonts = fonts.len(),
            vibe = vibe.len(),
            "reference cache built"
        );
        Ok(ReferenceCache { logos, fonts, vibe })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use onbrand_core::asset::{Asset, AssetCategory, AssetSource};
    use onbrand_core::geometry::BoundingBox;
    use onbrand_inference::InferenceError;

    struct MeanEmbedder;

    #[async_trait]
    impl Embedder for MeanEmbedder {
        async fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
            let rgb = image.to_rgb8();
            let n = (rgb.width() * rgb.height()).max(1) as f32;
            let sum: f32 = rgb.pixels().map(|p| p.0[0] as f32).sum();
            Ok(vec![sum / n / 255.0, 1.0])
        }

        async fn embed_text(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    /// Deterministic high-contrast texture so corner detection finds
    /// plenty of features.
    fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let bx = x / 4;
            let by = y / 4;
            let h = bx
                .wrapping_mul(73)
                .wrapping_add(by.wrapping_mul(151))
                .wrapping_add(seed.wrapping_mul(97));
            let v = ((h.wrapping_mul(2654435761)) >> 24) as u8;
            image::Rgb([v, v.wrapping_add(40), v.wrapping_add(80)])
        })
    }

    fn kit_with_logo_and_font() -> (BrandKit, ReferenceImages) {
        let mut kit = BrandKit::new("Acme");
        let asset = Asset::new(
            AssetCategory::Logo,
            AssetSource {
                file: "guide.pdf".into(),
                page: 1,
                region: BoundingBox::new(0, 0, 64, 64),
            },
            "abc".into(),
            vec![Rgb::new(0x11, 0x22, 0x33)],
            0.9,
        );
        let mut images = ReferenceImages::new();
        images.add_logo(asset.id, noise_image(64, 64, 1));
        images.add_glyphs("Acme Grotesk", RgbImage::from_pixel(32, 16, image::Rgb([0, 0, 0])));
        kit.logo_assets.push(asset);
        kit.typography
            .push(onbrand_core::font::FontSpec::new("Acme Grotesk").with_reference());
        kit.brand_voice.attributes = vec!["warm".into(), "  ".into()];
        (kit, images)
    }

    #[tokio::test]
    async fn build_populates_all_sections() {
        let (kit, images) = kit_with_logo_and_font();
        let cache = ReferenceCache::build(&kit, &images, &MeanEmbedder, &AuditConfig::default())
            .await
            .unwrap();

        assert_eq!(cache.logos.len(), 1);
        assert!(!cache.logos[0].features.is_empty());
        assert_eq!(cache.logos[0].dominant, vec![Rgb::new(0x11, 0x22, 0x33)]);
        assert_eq!(cache.logos[0].aspect_ratio, Some(1.0));

        assert_eq!(cache.fonts.len(), 1);
        assert_eq!(cache.fonts[0].normalized, "acme grotesk");
        assert_eq!(cache.fonts[0].embedding.len(), 2);

        // The blank attribute is dropped.
        assert_eq!(cache.vibe.len(), 1);
        assert_eq!(cache.vibe[0].keyword, "warm");
    }

    #[tokio::test]
    async fn missing_rasters_are_skipped_not_fatal() {
        let (mut kit, _) = kit_with_logo_and_font();
        kit.typography
            .push(onbrand_core::font::FontSpec::new("Acme Serif").with_reference());
        let empty = ReferenceImages::new();
        let cache = ReferenceCache::build(&kit, &empty, &MeanEmbedder, &AuditConfig::default())
            .await
            .unwrap();
        assert!(cache.logos.is_empty());
        assert!(cache.fonts.is_empty());
    }

    #[tokio::test]
    async fn featureless_logo_reference_is_skipped() {
        let (mut kit, mut images) = kit_with_logo_and_font();
        let flat = RgbImage::from_pixel(64, 64, image::Rgb([200, 200, 200]));
        images.add_logo(kit.logo_assets[0].id, flat);
        kit.brand_voice.attributes.clear();
        let cache = ReferenceCache::build(&kit, &images, &MeanEmbedder, &AuditConfig::default())
            .await
            .unwrap();
        assert!(cache.logos.is_empty());
    }
}
