//! Visual assets harvested from guideline documents.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::CoreError;
use crate::geometry::BoundingBox;
use crate::types::EntityId;

/// What a cropped guideline region depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Logo,
    ColorSwatch,
    FontSpecimen,
    Photograph,
    /// Classifier confidence fell below the floor; kept for bookkeeping,
    /// never used as a reference.
    Unknown,
}

/// Categories the zero-shot classifier is asked to choose between.
pub const CLASSIFIABLE: [AssetCategory; 4] = [
    AssetCategory::Logo,
    AssetCategory::ColorSwatch,
    AssetCategory::FontSpecimen,
    AssetCategory::Photograph,
];

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Logo => "logo",
            AssetCategory::ColorSwatch => "color_swatch",
            AssetCategory::FontSpecimen => "font_specimen",
            AssetCategory::Photograph => "photograph",
            AssetCategory::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "logo" => Ok(AssetCategory::Logo),
            "color_swatch" => Ok(AssetCategory::ColorSwatch),
            "font_specimen" => Ok(AssetCategory::FontSpecimen),
            "photograph" => Ok(AssetCategory::Photograph),
            "unknown" => Ok(AssetCategory::Unknown),
            other => Err(CoreError::Validation(format!(
                "Unknown asset category: {other}"
            ))),
        }
    }

    /// Natural-language label handed to the zero-shot classifier.
    pub fn descriptor_text(&self) -> &'static str {
        match self {
            AssetCategory::Logo => "a company logo or brand mark",
            AssetCategory::ColorSwatch => "a color palette swatch card",
            AssetCategory::FontSpecimen => "a typography specimen showing letterforms",
            AssetCategory::Photograph => "a photograph",
            AssetCategory::Unknown => "unrecognized content",
        }
    }

    /// Reverse of [`descriptor_text`](Self::descriptor_text) for winning
    /// classifier labels. `None` for labels outside the candidate set.
    pub fn from_descriptor(label: &str) -> Option<Self> {
        CLASSIFIABLE
            .iter()
            .copied()
            .find(|c| c.descriptor_text() == label)
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an asset was cropped from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSource {
    /// Source file name as uploaded.
    pub file: String,
    /// One-based page number.
    pub page: u32,
    pub region: BoundingBox,
}

/// A classified crop plus the fingerprint of its pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: EntityId,
    pub category: AssetCategory,
    pub source: AssetSource,
    /// SHA-256 of the crop's encoded bytes.
    pub image_sha256: String,
    /// Up to `k` dominant colors, most common first.
    pub dominant_colors: Vec<Rgb>,
    /// Classifier score for the winning category.
    pub confidence: f32,
}

impl Asset {
    pub fn new(
        category: AssetCategory,
        source: AssetSource,
        image_sha256: String,
        dominant_colors: Vec<Rgb>,
        confidence: f32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            category,
            source,
            image_sha256,
            dominant_colors,
            confidence,
        }
    }
}
