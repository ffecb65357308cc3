//! The assembled brand kit.
//!
//! A [`BrandKit`] is the immutable output of ingestion and the sole input
//! (besides the pages under audit) to the audit engine. Nothing mutates a
//! kit after assembly; re-ingestion produces a new one.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::CoreError;
use crate::font::FontSpec;
use crate::logo_rule::LogoRule;
use crate::swatch::ColorSwatch;
use crate::types::{EntityId, Timestamp};

/// A guideline file that contributed to the kit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFileRef {
    pub name: String,
    /// SHA-256 of the uploaded bytes.
    pub sha256: String,
}

/// Tone keywords extracted from the guidelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandVoice {
    /// Positive descriptors; imagery checks use them as "vibe" anchors.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Things the brand never does, e.g. banned typefaces.
    #[serde(default)]
    pub forbidden_keywords: Vec<String>,
}

impl BrandVoice {
    /// Case-insensitive test of whether a label trips a forbidden keyword.
    pub fn is_forbidden(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.forbidden_keywords
            .iter()
            .any(|k| !k.trim().is_empty() && label.contains(&k.trim().to_lowercase()))
    }
}

/// Everything the audit side needs to know about a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandKit {
    pub id: EntityId,
    pub title: String,
    /// Contributing files in upload order.
    pub source_files: Vec<SourceFileRef>,
    pub colors: Vec<ColorSwatch>,
    pub typography: Vec<FontSpec>,
    pub logo_rules: Vec<LogoRule>,
    pub brand_voice: BrandVoice,
    /// Assets classified as logo variants during ingestion.
    pub logo_assets: Vec<Asset>,
    pub created_at: Timestamp,
}

impl BrandKit {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            title: title.into(),
            source_files: Vec::new(),
            colors: Vec::new(),
            typography: Vec::new(),
            logo_rules: Vec::new(),
            brand_voice: BrandVoice::default(),
            logo_assets: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Structural validation of an assembled kit.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Brand kit title is empty".into()));
        }
        let mut seen_hex: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for swatch in &self.colors {
            swatch.rgb()?;
            if !seen_hex.insert(swatch.hex.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate palette entry: {}",
                    swatch.hex
                )));
            }
        }
        for font in &self.typography {
            if font.family.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Typography entry with empty family name".into(),
                ));
            }
        }
        Ok(())
    }

    /// Typefaces usable for mechanical matching.
    pub fn referenced_fonts(&self) -> impl Iterator<Item = &FontSpec> {
        self.typography.iter().filter(|f| f.has_reference)
    }
}
