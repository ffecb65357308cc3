//! Kit assembly pipeline.
//!
//! [`BrandKitBuilder`] turns rendered source documents into a validated
//! [`BrandKit`]: classify every figure region, extract structured facts
//! from the combined text, fall back to dominant-color clustering when the
//! text yields no palette, deduplicate swatches, and mark which typefaces
//! have an uploaded glyph specimen. Data-quality problems that do not
//! invalidate the kit come back as warnings, not errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use onbrand_core::asset::{Asset, AssetCategory, AssetSource};
use onbrand_core::brand_kit::{BrandKit, SourceFileRef};
use onbrand_core::color::{dominant_colors, Rgb, KMEANS_MAX_ITERS};
use onbrand_core::font::{normalize_family, FontSpec};
use onbrand_core::geometry::BoundingBox;
use onbrand_core::hashing::sha256_hex;
use onbrand_core::inspection::{DataQualityNote, NoteKind};
use onbrand_core::swatch::{dedup_swatches, ColorSwatch};
use onbrand_inference::{Classifier, GuidelineModel};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::classifier::AssetClassifier;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::extractor::{ExtractionOutcome, GuidelineExtractor};
use crate::source::{crop_region, SourceDocument, SourceKind};

/// A built kit plus non-fatal data-quality findings.
#[derive(Debug)]
pub struct BuildOutcome {
    pub kit: BrandKit,
    pub warnings: Vec<DataQualityNote>,
}

/// One region queued for classification.
struct RegionJob {
    file: String,
    page: u32,
    region: BoundingBox,
    crop: RgbImage,
}

/// Classification result for one region, pixels retained for the
/// dominant-color fallback.
struct ClassifiedRegion {
    asset: Asset,
    pixels: Vec<Rgb>,
}

/// Assembles brand kits from rendered guideline documents.
pub struct BrandKitBuilder {
    classifier: AssetClassifier,
    extractor: GuidelineExtractor,
    config: IngestConfig,
}

impl BrandKitBuilder {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        model: Arc<dyn GuidelineModel>,
        config: IngestConfig,
    ) -> Self {
        let min_confidence = config.classifier_min_confidence;
        Self {
            classifier: AssetClassifier::new(classifier, min_confidence),
            extractor: GuidelineExtractor::new(model),
            config,
        }
    }

    /// Build a kit from the given documents.
    ///
    /// Structural problems (empty documents, zero-pixel pages, off-page
    /// regions) are fatal and nothing partial is returned. Inference
    /// failures on individual regions are not: those regions degrade to
    /// `Unknown` and the build continues.
    pub async fn build(
        &self,
        title: impl Into<String>,
        documents: &[SourceDocument],
    ) -> Result<BuildOutcome, IngestError> {
        for doc in documents {
            doc.validate()?;
        }

        let mut warnings = Vec::new();

        let classified = self.classify_regions(documents).await;
        let extraction = self.extract_facts(documents).await?;

        let guideline_names: Vec<&str> = documents
            .iter()
            .filter(|d| d.kind == SourceKind::Guidelines)
            .map(|d| d.name.as_str())
            .collect();
        if extraction.low_yield {
            warnings.push(DataQualityNote::new(
                NoteKind::LowYield,
                guideline_names.join(", "),
                "no colors or typography found in the document text",
            ));
        }

        let colors = self.resolve_colors(&extraction, &classified, &mut warnings);
        let typography = resolve_typography(extraction.fonts, documents, &mut warnings);

        let mut kit = BrandKit::new(title);
        kit.source_files = documents
            .iter()
            .map(|d| SourceFileRef {
                name: d.name.clone(),
                sha256: d.fingerprint(),
            })
            .collect();
        kit.colors = colors;
        kit.typography = typography;
        kit.logo_rules = extraction.logo_rules;
        kit.brand_voice = extraction.voice;
        kit.logo_assets = classified
            .into_iter()
            .map(|c| c.asset)
            .filter(|a| a.category == AssetCategory::Logo)
            .collect();

        kit.validate()?;
        info!(
            kit_id = %kit.id,
            colors = kit.colors.len(),
            fonts = kit.typography.len(),
            rules = kit.logo_rules.len(),
            logos = kit.logo_assets.len(),
            warnings = warnings.len(),
            "brand kit assembled"
        );
        Ok(BuildOutcome { kit, warnings })
    }

    // ---- pipeline stages ----

    /// Classify every region crop, at most `max_concurrent` at a time.
    /// Results come back in (document, page, region) order.
    async fn classify_regions(&self, documents: &[SourceDocument]) -> Vec<ClassifiedRegion> {
        let mut jobs = Vec::new();
        for doc in documents {
            if doc.kind != SourceKind::Guidelines {
                continue;
            }
            for page in &doc.pages {
                for region in &page.regions {
                    // validate() already rejected off-page regions.
                    if let Some(crop) = crop_region(&page.image, region) {
                        jobs.push(RegionJob {
                            file: doc.name.clone(),
                            page: page.number,
                            region: *region,
                            crop,
                        });
                    }
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut tasks = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            // The semaphore is never closed, so acquisition only fails
            // while the runtime is tearing down.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let classifier = self.classifier.clone();
            let kmeans_k = self.config.kmeans_k;
            tasks.spawn(async move {
                let _permit = permit;
                (index, classify_one(&classifier, kmeans_k, job).await)
            });
        }

        // Keyed by submission index so completion order cannot reorder
        // the asset list.
        let mut ordered = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, region)) => {
                    ordered.insert(index, region);
                }
                Err(e) => warn!(error = %e, "region classification task failed"),
            }
        }
        ordered.into_values().collect()
    }

    /// One extraction call over the combined text of all guideline pages.
    async fn extract_facts(
        &self,
        documents: &[SourceDocument],
    ) -> Result<ExtractionOutcome, IngestError> {
        let text = documents
            .iter()
            .filter(|d| d.kind == SourceKind::Guidelines)
            .map(|d| d.combined_text())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            debug!("no document text to extract from");
            return Ok(ExtractionOutcome {
                low_yield: true,
                ..ExtractionOutcome::default()
            });
        }
        Ok(self.extractor.extract(&text).await?)
    }

    /// Extracted palette, or the dominant-color fallback over swatch-card
    /// regions when the text yielded none. Near-duplicates are dropped
    /// first-seen-wins and reported.
    fn resolve_colors(
        &self,
        extraction: &ExtractionOutcome,
        classified: &[ClassifiedRegion],
        warnings: &mut Vec<DataQualityNote>,
    ) -> Vec<ColorSwatch> {
        let candidates = if extraction.colors.is_empty() {
            let pool: Vec<Rgb> = classified
                .iter()
                .filter(|c| c.asset.category == AssetCategory::ColorSwatch)
                .flat_map(|c| c.pixels.iter().copied())
                .collect();
            let clusters = dominant_colors(&pool, self.config.kmeans_k, KMEANS_MAX_ITERS);
            if !clusters.is_empty() {
                debug!(
                    clusters = clusters.len(),
                    "palette recovered from swatch regions"
                );
            }
            clusters
                .into_iter()
                .map(|rgb| ColorSwatch {
                    hex: rgb.to_hex(),
                    cmyk: None,
                    pms: None,
                    name: None,
                    usage: None,
                })
                .collect()
        } else {
            extraction.colors.clone()
        };

        let (kept, dropped) = dedup_swatches(candidates, self.config.swatch_dedup_distance);
        for swatch in dropped {
            warnings.push(DataQualityNote::new(
                NoteKind::NearDuplicateSwatch,
                swatch.hex.clone(),
                format!(
                    "within distance {} of an earlier palette entry",
                    self.config.swatch_dedup_distance
                ),
            ));
        }
        kept
    }
}

/// Classify one region crop and compute its dominant colors when it is a
/// logo. Inference failures degrade the region to `Unknown`.
async fn classify_one(
    classifier: &AssetClassifier,
    kmeans_k: usize,
    job: RegionJob,
) -> ClassifiedRegion {
    let image_sha256 = sha256_hex(job.crop.as_raw());
    let pixels: Vec<Rgb> = job
        .crop
        .pixels()
        .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
        .collect();

    let crop = DynamicImage::ImageRgb8(job.crop);
    let (category, confidence) = match classifier.classify_region(&crop).await {
        Ok(result) => result,
        Err(e) => {
            warn!(
                file = %job.file,
                page = job.page,
                error = %e,
                "region classification failed, treating as unknown"
            );
            (AssetCategory::Unknown, 0.0)
        }
    };

    let dominant = if category == AssetCategory::Logo {
        dominant_colors(&pixels, kmeans_k, KMEANS_MAX_ITERS)
    } else {
        Vec::new()
    };

    ClassifiedRegion {
        asset: Asset::new(
            category,
            AssetSource {
                file: job.file,
                page: job.page,
                region: job.region,
            },
            image_sha256,
            dominant,
            confidence,
        ),
        pixels,
    }
}

/// Mark `has_reference` on extracted fonts from uploaded glyph specimens,
/// appending specimen families the text never mentioned. Fonts left
/// without a specimen get a `ReferenceMissing` warning.
fn resolve_typography(
    fonts: Vec<FontSpec>,
    documents: &[SourceDocument],
    warnings: &mut Vec<DataQualityNote>,
) -> Vec<FontSpec> {
    let specimen_families: Vec<String> = documents
        .iter()
        .filter_map(|d| match &d.kind {
            SourceKind::GlyphReference { family } => Some(family.clone()),
            SourceKind::Guidelines => None,
        })
        .collect();

    let mut typography: Vec<FontSpec> = fonts
        .into_iter()
        .map(|font| {
            let has_ref = specimen_families
                .iter()
                .any(|f| normalize_family(f) == font.normalized_family());
            if has_ref {
                font.with_reference()
            } else {
                font
            }
        })
        .collect();

    // Specimens for families the extractor missed still enter the kit;
    // the caller uploaded them deliberately.
    for family in &specimen_families {
        let known = typography
            .iter()
            .any(|f| f.normalized_family() == normalize_family(family));
        if !known {
            typography.push(FontSpec::new(family.clone()).with_reference());
        }
    }

    for font in typography.iter().filter(|f| !f.has_reference) {
        warnings.push(DataQualityNote::new(
            NoteKind::ReferenceMissing,
            font.family.clone(),
            "no glyph specimen uploaded; typography checks will skip this family",
        ));
    }
    typography
}
