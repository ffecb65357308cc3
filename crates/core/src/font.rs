//! Typography entries.

use serde::{Deserialize, Serialize};

/// A typeface registered in the brand kit.
///
/// `has_reference` records whether ingestion found a rendered specimen for
/// the family. Without one the entry is documentation only: typography
/// matching skips it and audits surface a reference-missing note instead
/// of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default)]
    pub has_reference: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weights: Vec::new(),
            usage: None,
            has_reference: false,
        }
    }

    pub fn with_weights(mut self, weights: Vec<String>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_reference(mut self) -> Self {
        self.has_reference = true;
        self
    }

    /// Lowercased, whitespace-collapsed family name for comparisons.
    pub fn normalized_family(&self) -> String {
        normalize_family(&self.family)
    }
}

/// Canonical form of a family name: lowercased, whitespace collapsed.
pub fn normalize_family(family: &str) -> String {
    family
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_family_collapses_whitespace_and_case() {
        let f = FontSpec::new("  Acme   Grotesk  ");
        assert_eq!(f.normalized_family(), "acme grotesk");
        assert_eq!(FontSpec::new("ACME GROTESK").normalized_family(), "acme grotesk");
    }

    #[test]
    fn builder_sets_reference_flag() {
        let f = FontSpec::new("Acme Serif")
            .with_weights(vec!["regular".into(), "bold".into()])
            .with_usage("headlines")
            .with_reference();
        assert!(f.has_reference);
        assert_eq!(f.weights.len(), 2);
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let f: FontSpec = serde_json::from_str(r#"{ "family": "Acme Sans" }"#).unwrap();
        assert_eq!(f.family, "Acme Sans");
        assert!(f.weights.is_empty());
        assert!(!f.has_reference);
    }
}
