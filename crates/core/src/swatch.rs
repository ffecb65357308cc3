//! Brand palette entries.

use serde::{Deserialize, Serialize};

use crate::color::{euclidean_distance, Rgb};
use crate::error::CoreError;

/// Where a palette color is meant to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwatchUsage {
    Primary,
    Secondary,
    Accent,
}

impl SwatchUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwatchUsage::Primary => "primary",
            SwatchUsage::Secondary => "secondary",
            SwatchUsage::Accent => "accent",
        }
    }
}

/// A named brand color. Only `hex` is required; print-side identifiers
/// travel along when the guidelines provide them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    /// `#RRGGBB`, uppercase.
    pub hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmyk: Option<[f32; 4]>,
    /// Pantone identifier, e.g. `"PMS 2347 C"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<SwatchUsage>,
}

impl ColorSwatch {
    /// Swatch with just a hex value, normalized to uppercase.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let rgb = Rgb::from_hex(hex)?;
        Ok(Self {
            hex: rgb.to_hex(),
            cmyk: None,
            pms: None,
            name: None,
            usage: None,
        })
    }

    pub fn rgb(&self) -> Result<Rgb, CoreError> {
        Rgb::from_hex(&self.hex)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_usage(mut self, usage: SwatchUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Drop near-duplicate swatches, keeping the first occurrence.
///
/// Returns `(kept, dropped)`. Swatches whose hex fails to parse are kept
/// untouched; validation elsewhere reports them.
pub fn dedup_swatches(
    swatches: Vec<ColorSwatch>,
    min_distance: f64,
) -> (Vec<ColorSwatch>, Vec<ColorSwatch>) {
    let mut kept: Vec<ColorSwatch> = Vec::with_capacity(swatches.len());
    let mut kept_rgb: Vec<Option<Rgb>> = Vec::with_capacity(swatches.len());
    let mut dropped = Vec::new();

    for swatch in swatches {
        let rgb = swatch.rgb().ok();
        let duplicate = match rgb {
            Some(c) => kept_rgb.iter().any(|k| match k {
                Some(existing) => euclidean_distance(c, *existing) < min_distance,
                None => false,
            }),
            None => false,
        };
        if duplicate {
            dropped.push(swatch);
        } else {
            kept.push(swatch);
            kept_rgb.push(rgb);
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SWATCH_DEDUP_DISTANCE;
    use assert_matches::assert_matches;

    #[test]
    fn from_hex_normalizes_case() {
        let s = ColorSwatch::from_hex("#a1b2c3").unwrap();
        assert_eq!(s.hex, "#A1B2C3");
        assert_eq!(s.rgb().unwrap(), Rgb::new(0xA1, 0xB2, 0xC3));
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert_matches!(ColorSwatch::from_hex("teal"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn serde_omits_absent_print_identifiers() {
        let s = ColorSwatch::from_hex("#112233").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json, serde_json::json!({ "hex": "#112233" }));
    }

    #[test]
    fn usage_serializes_snake_case() {
        let s = ColorSwatch::from_hex("#112233")
            .unwrap()
            .with_usage(SwatchUsage::Primary);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["usage"], "primary");
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let swatches = vec![
            ColorSwatch::from_hex("#C8281E").unwrap().with_name("brick"),
            ColorSwatch::from_hex("#C8281F").unwrap(),
            ColorSwatch::from_hex("#1428C8").unwrap(),
        ];
        let (kept, dropped) = dedup_swatches(swatches, SWATCH_DEDUP_DISTANCE);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].name.as_deref(), Some("brick"));
        assert_eq!(kept[1].hex, "#1428C8");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].hex, "#C8281F");
    }

    #[test]
    fn dedup_distance_boundary_is_exclusive() {
        // Distance exactly 10.0 apart stays.
        let swatches = vec![
            ColorSwatch::from_hex("#646464").unwrap(),
            ColorSwatch::from_hex("#6E6464").unwrap(),
        ];
        let (kept, dropped) = dedup_swatches(swatches, SWATCH_DEDUP_DISTANCE);
        assert_eq!(kept.len(), 2);
        assert!(dropped.is_empty());
    }
}
