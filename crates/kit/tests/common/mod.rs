//! Shared fixtures for ingestion integration tests.

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use onbrand_core::geometry::BoundingBox;
use onbrand_inference::{Classifier, GuidelineModel, InferenceError, LabelScore};
use onbrand_kit::source::SourcePage;

/// Classifies crops by their top-left pixel: pure red is a logo, pure
/// green is a swatch card, anything else is unrecognized. Keeps test
/// scenarios deterministic without scripting call order.
pub struct ColorKeyedClassifier;

#[async_trait]
impl Classifier for ColorKeyedClassifier {
    async fn classify(
        &self,
        image: &DynamicImage,
        _labels: &[String],
    ) -> Result<LabelScore, InferenceError> {
        let rgb = image.to_rgb8();
        let p = rgb.get_pixel(0, 0);
        let (label, score) = match (p[0], p[1], p[2]) {
            (255, 0, 0) => ("a company logo or brand mark", 0.94),
            (0, 255, 0) => ("a color palette swatch card", 0.88),
            _ => ("a photograph", 0.10),
        };
        Ok(LabelScore {
            label: label.to_string(),
            score,
        })
    }
}

/// Every classification call fails with a server error.
pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(
        &self,
        _image: &DynamicImage,
        _labels: &[String],
    ) -> Result<LabelScore, InferenceError> {
        Err(InferenceError::Api {
            status: 500,
            body: "classifier offline".into(),
        })
    }
}

/// Replies with a canned string regardless of the prompt.
pub struct FixedModel(pub String);

#[async_trait]
impl GuidelineModel for FixedModel {
    async fn extract(&self, _system: &str, _prompt: &str) -> Result<String, InferenceError> {
        Ok(self.0.clone())
    }
}

/// A well-formed extraction reply used by the happy-path scenarios.
pub fn full_reply() -> String {
    r##"{
        "colors": [
            {"hex": "#C8281E", "name": "Brick", "usage": "primary"},
            {"hex": "#1428C8", "name": "Cobalt", "usage": "secondary"}
        ],
        "fonts": [
            {"family": "Acme Grotesk", "weights": ["regular", "bold"]},
            {"family": "Acme Serif"}
        ],
        "logo_rules": [
            {"type": "DONT", "rule": "Do not stretch or distort the logo."},
            {"type": "DO", "rule": "Keep clear space around the mark."}
        ],
        "voice": {"attributes": ["warm", "confident"], "forbidden": ["Comic Sans"]}
    }"##
    .to_string()
}

pub fn fill_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..(y + h).min(image.height()) {
        for px in x..(x + w).min(image.width()) {
            image.put_pixel(px, py, color);
        }
    }
}

/// A white guideline page with a red logo region and a green swatch-card
/// region, both fully inside their marked boxes.
pub fn figure_page(number: u32, text: &str) -> SourcePage {
    let mut image = RgbImage::from_pixel(200, 120, Rgb([255, 255, 255]));
    fill_rect(&mut image, 10, 10, 60, 60, Rgb([255, 0, 0]));
    fill_rect(&mut image, 100, 10, 60, 60, Rgb([0, 255, 0]));
    SourcePage {
        number,
        image,
        text: text.to_string(),
        regions: vec![
            BoundingBox::new(10, 10, 60, 60),
            BoundingBox::new(100, 10, 60, 60),
        ],
    }
}

pub fn glyph_specimen() -> RgbImage {
    let mut image = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
    fill_rect(&mut image, 8, 8, 16, 16, Rgb([0, 0, 0]));
    image
}
