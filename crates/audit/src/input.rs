//! Audit input contract.
//!
//! The rendering collaborator delivers rasterized pages plus layout boxes
//! (text runs from the PDF text layer or OCR, embedded-image boxes). A
//! page with no text blocks simply produces no typography records, and no
//! image regions means no imagery records; absent data is not a violation.

use image::{DynamicImage, RgbImage};
use onbrand_core::geometry::BoundingBox;

use crate::error::AuditError;

/// One text run with its bounding box on the page.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub region: BoundingBox,
    pub text: String,
}

/// One rendered page under audit.
#[derive(Debug)]
pub struct PageInput {
    /// One-based page number.
    pub page_number: u32,
    pub image: DynamicImage,
    pub text_blocks: Vec<TextBlock>,
    /// Embedded figures; classified by the engine for routing and excluded
    /// from background color sampling.
    pub image_regions: Vec<BoundingBox>,
}

/// A document under audit.
#[derive(Debug)]
pub struct DocumentInput {
    pub name: String,
    pub pages: Vec<PageInput>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, pages: Vec<PageInput>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    /// Structural checks before any work is fanned out.
    pub fn validate(&self) -> Result<(), AuditError> {
        let fail = |reason: String| AuditError::MalformedDocument {
            name: self.name.clone(),
            reason,
        };
        if self.pages.is_empty() {
            return Err(fail("no pages".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for page in &self.pages {
            if page.image.width() == 0 || page.image.height() == 0 {
                return Err(fail(format!("page {} has no pixels", page.page_number)));
            }
            if !seen.insert(page.page_number) {
                return Err(fail(format!("duplicate page number {}", page.page_number)));
            }
        }
        Ok(())
    }
}

/// Crop a page to a layout box, clamped to the page bounds. `None` when
/// the box falls entirely off the page.
pub(crate) fn crop_region(page: &RgbImage, region: &BoundingBox) -> Option<RgbImage> {
    let clamped = region.clamp_to(page.width(), page.height())?;
    Some(
        image::imageops::crop_imm(
            page,
            clamped.x as u32,
            clamped.y as u32,
            clamped.width as u32,
            clamped.height as u32,
        )
        .to_image(),
    )
}
