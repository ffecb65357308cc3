//! Shared fixtures for audit engine integration tests.

use async_trait::async_trait;
use image::{DynamicImage, RgbImage};
use onbrand_audit::{PageInput, ReferenceImages};
use onbrand_core::asset::{Asset, AssetCategory, AssetSource};
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::color::{mean_color, Rgb};
use onbrand_core::geometry::BoundingBox;
use onbrand_core::swatch::ColorSwatch;
use onbrand_inference::{Classifier, Embedder, InferenceError, LabelScore};

/// Deterministic block-noise texture with enough corners for keypoint
/// matching. Channels stay under 0x70, so constant shifts cannot clip.
pub fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let bx = x / 4;
        let by = y / 4;
        let h = bx
            .wrapping_mul(73)
            .wrapping_add(by.wrapping_mul(151))
            .wrapping_add(seed.wrapping_mul(97));
        let v = ((h.wrapping_mul(2654435761)) >> 26) as u8;
        image::Rgb([v, v.wrapping_add(24), v.wrapping_add(48)])
    })
}

/// Shift every channel by a constant. Geometry survives, color does not.
pub fn recolor(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        image::Rgb([p.0[0] + 0x88, p.0[1] + 0x66, p.0[2] + 0x44])
    })
}

pub fn pixel_mean(image: &RgbImage) -> Rgb {
    let pixels: Vec<Rgb> = image
        .pixels()
        .map(|p| Rgb::new(p.0[0], p.0[1], p.0[2]))
        .collect();
    mean_color(&pixels).unwrap()
}

/// Kit with one logo variant whose dominant color is the raster mean.
pub fn kit_with_logo(logo: &RgbImage, palette: &[&str]) -> (BrandKit, ReferenceImages) {
    let mut kit = BrandKit::new("Acme");
    kit.colors = palette
        .iter()
        .map(|h| ColorSwatch::from_hex(h).unwrap())
        .collect();
    let asset = Asset::new(
        AssetCategory::Logo,
        AssetSource {
            file: "brand.pdf".into(),
            page: 1,
            region: BoundingBox::new(0, 0, logo.width() as i32, logo.height() as i32),
        },
        "0".repeat(64),
        vec![pixel_mean(logo)],
        0.95,
    );
    let mut images = ReferenceImages::new();
    images.add_logo(asset.id, logo.clone());
    kit.logo_assets.push(asset);
    (kit, images)
}

/// White page with one raster pasted at `(x, y)` and registered as an
/// embedded figure.
pub fn page_with_figure(number: u32, figure: &RgbImage, x: i64, y: i64) -> PageInput {
    let mut page = RgbImage::from_pixel(320, 240, image::Rgb([255, 255, 255]));
    image::imageops::replace(&mut page, figure, x, y);
    PageInput {
        page_number: number,
        image: DynamicImage::ImageRgb8(page),
        text_blocks: Vec::new(),
        image_regions: vec![BoundingBox::new(
            x as i32,
            y as i32,
            figure.width() as i32,
            figure.height() as i32,
        )],
    }
}

pub fn blank_page(number: u32) -> PageInput {
    PageInput {
        page_number: number,
        image: DynamicImage::ImageRgb8(RgbImage::from_pixel(
            320,
            240,
            image::Rgb([255, 255, 255]),
        )),
        text_blocks: Vec::new(),
        image_regions: Vec::new(),
    }
}

/// White strip with three dark glyph squares, usable both as a specimen
/// raster and as page text.
pub fn glyph_strip() -> RgbImage {
    let mut img = RgbImage::from_pixel(30, 12, image::Rgb([255, 255, 255]));
    for i in 0..3u32 {
        for x in (i * 10 + 2)..(i * 10 + 8) {
            for y in 2..10 {
                img.put_pixel(x, y, image::Rgb([20, 20, 20]));
            }
        }
    }
    img
}

// ---- inference stubs ----

/// Never confident about anything; keeps region routing out of a test's
/// way.
pub struct UnsureClassifier;

#[async_trait]
impl Classifier for UnsureClassifier {
    async fn classify(
        &self,
        _image: &DynamicImage,
        _labels: &[String],
    ) -> Result<LabelScore, InferenceError> {
        Ok(LabelScore {
            label: "unrecognized content".into(),
            score: 0.1,
        })
    }
}

/// Calls a crop a photograph iff its top-left pixel is the blue marker.
pub struct MarkerClassifier;

pub const PHOTO_MARKER: image::Rgb<u8> = image::Rgb([0, 0, 255]);

#[async_trait]
impl Classifier for MarkerClassifier {
    async fn classify(
        &self,
        image: &DynamicImage,
        _labels: &[String],
    ) -> Result<LabelScore, InferenceError> {
        let rgb = image.to_rgb8();
        if *rgb.get_pixel(0, 0) == PHOTO_MARKER {
            Ok(LabelScore {
                label: "a photograph".into(),
                score: 0.9,
            })
        } else {
            Ok(LabelScore {
                label: "unrecognized content".into(),
                score: 0.1,
            })
        }
    }
}

/// Embeds by dominant ink: dark ink maps one way, red ink the other.
/// Text always embeds like dark ink, so dark content matches the vibe.
pub struct InkEmbedder;

#[async_trait]
impl Embedder for InkEmbedder {
    async fn embed_image(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        let rgb = image.to_rgb8();
        let mut red = 0usize;
        let mut dark = 0usize;
        for p in rgb.pixels() {
            if p.0[0] > 150 && p.0[1] < 100 && p.0[2] < 100 {
                red += 1;
            } else if p.0[0] < 100 && p.0[1] < 100 && p.0[2] < 100 {
                dark += 1;
            }
        }
        Ok(if red > dark {
            vec![0.0, 1.0]
        } else {
            vec![1.0, 0.0]
        })
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, InferenceError> {
        Ok(vec![1.0, 0.0])
    }
}

pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::Api {
            status: 500,
            body: "embedder down".into(),
        })
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::Api {
            status: 500,
            body: "embedder down".into(),
        })
    }
}
