//! Structured-fact extraction from guideline text.
//!
//! One model call per ingestion: the combined OCR text goes in with a
//! JSON-mode system prompt, and a permissive parser turns whatever comes
//! back into palette, typography, logo-rule, and brand-voice entries.
//! Anything the model did not state confidently gets dropped, never
//! invented; an unparseable reply degrades to an empty outcome that the
//! builder reports as low yield.

use std::sync::Arc;
use std::sync::LazyLock;

use onbrand_core::brand_kit::BrandVoice;
use onbrand_core::color::Rgb;
use onbrand_core::font::FontSpec;
use onbrand_core::logo_rule::{CheckableProperty, LogoRule, RuleKind};
use onbrand_core::swatch::{ColorSwatch, SwatchUsage};
use onbrand_inference::{GuidelineModel, InferenceError};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

/// Regex pattern for a six-digit hex color, `#` optional.
pub const HEX_PATTERN: &str = r"^#?[0-9A-Fa-f]{6}$";

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(HEX_PATTERN).expect("valid regex"));

/// System prompt for the extraction call. Requests strict JSON matching
/// the wire DTOs below.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r##"You extract brand guideline facts from document text.
Reply with JSON only, no prose, matching this schema:
{
  "colors": [{"hex": "#RRGGBB", "cmyk": [c,m,y,k], "pms": "...", "name": "...", "usage": "primary|secondary|accent"}],
  "fonts": [{"family": "...", "weights": ["..."], "usage": "..."}],
  "logo_rules": [{"type": "DO|DONT", "rule": "...", "property": "aspect_ratio|color_fidelity", "tolerance": 0.2}],
  "voice": {"attributes": ["..."], "forbidden": ["..."]}
}
Omit any field you are not confident about. Never invent values."##;

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ExtractedFacts {
    #[serde(default)]
    colors: Vec<ExtractedColor>,
    #[serde(default)]
    fonts: Vec<ExtractedFont>,
    #[serde(default)]
    logo_rules: Vec<ExtractedRule>,
    #[serde(default)]
    voice: Option<ExtractedVoice>,
}

#[derive(Debug, Deserialize)]
struct ExtractedColor {
    hex: Option<String>,
    cmyk: Option<[f32; 4]>,
    pms: Option<String>,
    name: Option<String>,
    usage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedFont {
    family: Option<String>,
    #[serde(default)]
    weights: Vec<String>,
    usage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedRule {
    #[serde(rename = "type")]
    kind: Option<String>,
    rule: Option<String>,
    property: Option<String>,
    tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExtractedVoice {
    #[serde(default)]
    attributes: Vec<String>,
    #[serde(default)]
    forbidden: Vec<String>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Validated extraction output, ready for kit assembly.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub colors: Vec<ColorSwatch>,
    pub fonts: Vec<FontSpec>,
    pub logo_rules: Vec<LogoRule>,
    pub voice: BrandVoice,
    /// Neither colors nor fonts were found; the builder records a warning.
    pub low_yield: bool,
}

/// Runs the extraction prompt and validates the reply.
pub struct GuidelineExtractor {
    model: Arc<dyn GuidelineModel>,
}

impl GuidelineExtractor {
    pub fn new(model: Arc<dyn GuidelineModel>) -> Self {
        Self { model }
    }

    /// Extract structured facts from combined document text.
    ///
    /// Transport failures propagate; a malformed reply does not, it just
    /// yields an empty, low-yield outcome.
    pub async fn extract(&self, document_text: &str) -> Result<ExtractionOutcome, InferenceError> {
        let reply = self
            .model
            .extract(EXTRACTION_SYSTEM_PROMPT, document_text)
            .await?;
        Ok(parse_reply(&reply))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_reply(reply: &str) -> ExtractionOutcome {
    let facts = match extract_json(reply) {
        Some(json) => match serde_json::from_str::<ExtractedFacts>(json) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "extraction reply was not valid JSON, treating as empty");
                ExtractedFacts::default()
            }
        },
        None => {
            warn!("extraction reply contained no JSON object");
            ExtractedFacts::default()
        }
    };

    let colors: Vec<ColorSwatch> = facts.colors.into_iter().filter_map(convert_color).collect();
    let fonts: Vec<FontSpec> = facts.fonts.into_iter().filter_map(convert_font).collect();
    let logo_rules: Vec<LogoRule> = facts
        .logo_rules
        .into_iter()
        .filter_map(convert_rule)
        .collect();
    let voice = facts
        .voice
        .map(|v| BrandVoice {
            attributes: clean_list(v.attributes),
            forbidden_keywords: clean_list(v.forbidden),
        })
        .unwrap_or_default();

    let low_yield = colors.is_empty() && fonts.is_empty();
    ExtractionOutcome {
        colors,
        fonts,
        logo_rules,
        voice,
        low_yield,
    }
}

/// Slice out the outermost JSON object; models like to wrap replies in
/// code fences or lead-in prose.
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

fn convert_color(c: ExtractedColor) -> Option<ColorSwatch> {
    let raw = c.hex?;
    let raw = raw.trim();
    if !HEX_RE.is_match(raw) {
        return None;
    }
    let rgb = Rgb::from_hex(raw).ok()?;
    let cmyk = c
        .cmyk
        .filter(|v| v.iter().all(|x| x.is_finite() && (0.0..=100.0).contains(x)));
    Some(ColorSwatch {
        hex: rgb.to_hex(),
        cmyk,
        pms: clean_opt(c.pms),
        name: clean_opt(c.name),
        usage: c.usage.as_deref().and_then(parse_usage),
    })
}

fn convert_font(f: ExtractedFont) -> Option<FontSpec> {
    let family = f.family?.trim().to_string();
    if family.is_empty() {
        return None;
    }
    let mut spec = FontSpec::new(family).with_weights(clean_list(f.weights));
    if let Some(usage) = clean_opt(f.usage) {
        spec = spec.with_usage(usage);
    }
    Some(spec)
}

fn convert_rule(r: ExtractedRule) -> Option<LogoRule> {
    let kind = match r.kind?.trim().to_uppercase().as_str() {
        "DO" => RuleKind::Do,
        "DONT" | "DON'T" => RuleKind::Dont,
        _ => return None,
    };
    let text = r.rule?.trim().to_string();
    if text.is_empty() {
        return None;
    }

    let property = r
        .property
        .as_deref()
        .and_then(parse_property)
        .or_else(|| sniff_property(kind, &text));

    match property {
        Some(property) => Some(LogoRule::MechanicallyCheckable {
            kind,
            property,
            tolerance: r
                .tolerance
                .filter(|t| t.is_finite() && *t > 0.0)
                .unwrap_or_else(|| property.default_tolerance()),
            text,
        }),
        None => Some(LogoRule::InformationalOnly { kind, text }),
    }
}

fn parse_property(s: &str) -> Option<CheckableProperty> {
    match s.trim().to_lowercase().as_str() {
        "aspect_ratio" | "aspect ratio" => Some(CheckableProperty::AspectRatio),
        "color_fidelity" | "color fidelity" => Some(CheckableProperty::ColorFidelity),
        _ => None,
    }
}

/// DON'T rules naming a measurable property become checkable even when the
/// model omitted the property field. The keyword list is deliberately
/// narrow; prose we cannot pin down stays informational.
fn sniff_property(kind: RuleKind, text: &str) -> Option<CheckableProperty> {
    if kind != RuleKind::Dont {
        return None;
    }
    let lower = text.to_lowercase();
    if ["stretch", "distort", "squash", "aspect ratio"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return Some(CheckableProperty::AspectRatio);
    }
    if ["recolor", "re-color", "tint", "alter the color", "change the color"]
        .iter()
        .any(|k| lower.contains(k))
    {
        return Some(CheckableProperty::ColorFidelity);
    }
    None
}

fn parse_usage(s: &str) -> Option<SwatchUsage> {
    match s.trim().to_lowercase().as_str() {
        "primary" => Some(SwatchUsage::Primary),
        "secondary" => Some(SwatchUsage::Secondary),
        "accent" => Some(SwatchUsage::Accent),
        _ => None,
    }
}

fn clean_opt(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
