//! Logo usage rules.
//!
//! Guidelines express logo rules as DO / DON'T statements. Most are prose
//! only ("maintain clear space"), but a few name a property this system can
//! verify mechanically. The enum keeps the two apart so auditors never have
//! to re-interpret free text, while the wire shape stays the flat
//! `{type, rule, property?, tolerance?}` object the extractor produces.

use serde::{Deserialize, Serialize};

use crate::geometry::DEFAULT_ASPECT_RATIO_TOLERANCE;

/// Default perceptual distance allowed between reference and detected logo
/// color before a color-fidelity rule fails.
pub const DEFAULT_COLOR_FIDELITY_TOLERANCE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "DO")]
    Do,
    #[serde(rename = "DONT")]
    Dont,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Do => "DO",
            RuleKind::Dont => "DONT",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logo properties the audit pipeline can measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckableProperty {
    AspectRatio,
    ColorFidelity,
}

impl CheckableProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckableProperty::AspectRatio => "aspect_ratio",
            CheckableProperty::ColorFidelity => "color_fidelity",
        }
    }

    pub fn default_tolerance(&self) -> f64 {
        match self {
            CheckableProperty::AspectRatio => DEFAULT_ASPECT_RATIO_TOLERANCE,
            CheckableProperty::ColorFidelity => DEFAULT_COLOR_FIDELITY_TOLERANCE,
        }
    }
}

/// One DO / DON'T statement from the guidelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LogoRuleWire", into = "LogoRuleWire")]
pub enum LogoRule {
    /// Names a measurable property; the logo auditor enforces it.
    MechanicallyCheckable {
        kind: RuleKind,
        property: CheckableProperty,
        tolerance: f64,
        text: String,
    },
    /// Prose guidance carried through to reports untouched.
    InformationalOnly { kind: RuleKind, text: String },
}

impl LogoRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            LogoRule::MechanicallyCheckable { kind, .. } => *kind,
            LogoRule::InformationalOnly { kind, .. } => *kind,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LogoRule::MechanicallyCheckable { text, .. } => text,
            LogoRule::InformationalOnly { text, .. } => text,
        }
    }

    pub fn is_checkable(&self) -> bool {
        matches!(self, LogoRule::MechanicallyCheckable { .. })
    }
}

/// Flat extractor-facing shape.
#[derive(Serialize, Deserialize)]
struct LogoRuleWire {
    #[serde(rename = "type")]
    kind: RuleKind,
    rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property: Option<CheckableProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tolerance: Option<f64>,
}

impl From<LogoRuleWire> for LogoRule {
    fn from(wire: LogoRuleWire) -> Self {
        match wire.property {
            Some(property) => LogoRule::MechanicallyCheckable {
                kind: wire.kind,
                property,
                tolerance: wire.tolerance.unwrap_or_else(|| property.default_tolerance()),
                text: wire.rule,
            },
            None => LogoRule::InformationalOnly {
                kind: wire.kind,
                text: wire.rule,
            },
        }
    }
}

impl From<LogoRule> for LogoRuleWire {
    fn from(rule: LogoRule) -> Self {
        match rule {
            LogoRule::MechanicallyCheckable {
                kind,
                property,
                tolerance,
                text,
            } => LogoRuleWire {
                kind,
                rule: text,
                property: Some(property),
                tolerance: Some(tolerance),
            },
            LogoRule::InformationalOnly { kind, text } => LogoRuleWire {
                kind,
                rule: text,
                property: None,
                tolerance: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn informational_rule_roundtrips() {
        let json = serde_json::json!({ "type": "DO", "rule": "Maintain clear space." });
        let rule: LogoRule = serde_json::from_value(json).unwrap();
        assert_matches!(
            &rule,
            LogoRule::InformationalOnly { kind: RuleKind::Do, text } if text == "Maintain clear space."
        );
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["type"], "DO");
        assert_eq!(back["rule"], "Maintain clear space.");
        assert!(back.get("property").is_none());
    }

    #[test]
    fn checkable_rule_parses_property_and_tolerance() {
        let json = serde_json::json!({
            "type": "DONT",
            "rule": "Do not stretch or distort the logo.",
            "property": "aspect_ratio",
            "tolerance": 0.15,
        });
        let rule: LogoRule = serde_json::from_value(json).unwrap();
        assert_matches!(
            rule,
            LogoRule::MechanicallyCheckable {
                kind: RuleKind::Dont,
                property: CheckableProperty::AspectRatio,
                tolerance,
                ..
            } if (tolerance - 0.15).abs() < 1e-12
        );
    }

    #[test]
    fn missing_tolerance_falls_back_per_property() {
        let json = serde_json::json!({
            "type": "DONT",
            "rule": "Never recolor the logo.",
            "property": "color_fidelity",
        });
        let rule: LogoRule = serde_json::from_value(json).unwrap();
        assert_matches!(
            rule,
            LogoRule::MechanicallyCheckable { tolerance, .. }
                if (tolerance - DEFAULT_COLOR_FIDELITY_TOLERANCE).abs() < 1e-12
        );
    }

    #[test]
    fn kind_and_text_accessors() {
        let rule = LogoRule::InformationalOnly {
            kind: RuleKind::Dont,
            text: "Do not place the logo on busy photography.".into(),
        };
        assert_eq!(rule.kind(), RuleKind::Dont);
        assert!(!rule.is_checkable());
        assert_eq!(rule.kind().as_str(), "DONT");
    }
}
