//! Ingestion input model.
//!
//! Upstream rendering (PDF rasterization, OCR, region detection) happens
//! outside this system; ingestion receives its output: per-page rasters,
//! per-page text, and candidate region boxes to classify.

use image::RgbImage;
use onbrand_core::geometry::BoundingBox;
use onbrand_core::hashing::sha256_hex;

use crate::error::IngestError;

/// What role a file plays in the kit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A guideline document contributing pages, text, and regions.
    Guidelines,
    /// A rendered glyph specimen for one font family; its presence flips
    /// that family's `has_reference`.
    GlyphReference { family: String },
}

/// One rendered page of a source document.
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// One-based page number.
    pub number: u32,
    pub image: RgbImage,
    /// OCR or embedded text for this page.
    pub text: String,
    /// Candidate figure regions detected by the renderer.
    pub regions: Vec<BoundingBox>,
}

/// An uploaded file, already rendered.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub kind: SourceKind,
    pub pages: Vec<SourcePage>,
}

impl SourceDocument {
    pub fn guidelines(name: impl Into<String>, pages: Vec<SourcePage>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Guidelines,
            pages,
        }
    }

    pub fn glyph_reference(
        name: impl Into<String>,
        family: impl Into<String>,
        image: RgbImage,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::GlyphReference {
                family: family.into(),
            },
            pages: vec![SourcePage {
                number: 1,
                image,
                text: String::new(),
                regions: Vec::new(),
            }],
        }
    }

    /// Content fingerprint over page rasters and text, stable across runs.
    pub fn fingerprint(&self) -> String {
        let mut bytes = Vec::new();
        for page in &self.pages {
            bytes.extend_from_slice(&page.number.to_be_bytes());
            bytes.extend_from_slice(&page.image.width().to_be_bytes());
            bytes.extend_from_slice(&page.image.height().to_be_bytes());
            bytes.extend_from_slice(page.image.as_raw());
            bytes.extend_from_slice(page.text.as_bytes());
        }
        sha256_hex(&bytes)
    }

    /// Structural checks: a document must have pages, every page must have
    /// pixels, and every region must intersect its page.
    pub fn validate(&self) -> Result<(), IngestError> {
        let fail = |reason: String| IngestError::MalformedDocument {
            name: self.name.clone(),
            reason,
        };
        if self.pages.is_empty() {
            return Err(fail("no pages".into()));
        }
        for page in &self.pages {
            let (w, h) = page.image.dimensions();
            if w == 0 || h == 0 {
                return Err(fail(format!("page {} has no pixels", page.number)));
            }
            for region in &page.regions {
                if region.clamp_to(w, h).is_none() {
                    return Err(fail(format!(
                        "page {} region {:?} lies outside the page",
                        page.number, region
                    )));
                }
            }
        }
        Ok(())
    }

    /// All page text joined in page order.
    pub fn combined_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Crop a region out of a page raster, clamped to the page.
pub fn crop_region(image: &RgbImage, region: &BoundingBox) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    let clamped = region.clamp_to(w, h)?;
    Some(
        image::imageops::crop_imm(
            image,
            clamped.x as u32,
            clamped.y as u32,
            clamped.width as u32,
            clamped.height as u32,
        )
        .to_image(),
    )
}
