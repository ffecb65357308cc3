//! End-to-end audit engine scenarios against stub inference providers.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::*;
use image::{DynamicImage, RgbImage};
use onbrand_audit::{
    AuditConfig, AuditEngine, AuditError, DocumentInput, PageInput, ReferenceCache, TextBlock,
};
use onbrand_core::aggregate::AuditReport;
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::font::FontSpec;
use onbrand_core::geometry::BoundingBox;
use onbrand_core::inspection::{AuditCategory, CheckStatus, NoteKind, Severity};
use onbrand_inference::{Classifier, Embedder};
use tokio_util::sync::CancellationToken;

async fn cache_for(
    kit: &BrandKit,
    images: &onbrand_audit::ReferenceImages,
    embedder: &dyn Embedder,
) -> Arc<ReferenceCache> {
    Arc::new(
        ReferenceCache::build(kit, images, embedder, &AuditConfig::default())
            .await
            .unwrap(),
    )
}

fn engine(classifier: Arc<dyn Classifier>, embedder: Arc<dyn Embedder>) -> AuditEngine {
    AuditEngine::new(AuditConfig::default(), classifier, embedder)
}

/// A page carrying the registered logo untouched at original scale comes
/// back clean: a passing logo record and no failures anywhere.
#[tokio::test]
async fn untouched_logo_on_clean_page_passes() {
    let logo = noise_image(64, 64, 5);
    let (kit, images) = kit_with_logo(&logo, &["#112233"]);
    let kit = Arc::new(kit);
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let engine = engine(Arc::new(UnsureClassifier), embedder);
    let document = DocumentInput::new("clean.pdf", vec![page_with_figure(1, &logo, 60, 40)]);
    let report = engine
        .audit(document, kit, cache, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.inconclusive, 0);
    let logo_records: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.category == AuditCategory::Logo)
        .collect();
    assert_eq!(logo_records.len(), 1);
    assert_eq!(logo_records[0].status, CheckStatus::Pass);
}

/// A recolored logo is one medium logo failure, and because the figure box
/// is excluded from sampling it never doubles as a palette violation.
#[tokio::test]
async fn recolored_logo_fails_once_without_palette_echo() {
    let logo = noise_image(64, 64, 5);
    let (kit, images) = kit_with_logo(&logo, &["#112233"]);
    let kit = Arc::new(kit);
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let engine = engine(Arc::new(UnsureClassifier), embedder);
    let document = DocumentInput::new(
        "recolored.pdf",
        vec![page_with_figure(1, &recolor(&logo), 60, 40)],
    );
    let report = engine
        .audit(document, kit, cache, CancellationToken::new())
        .await
        .unwrap();

    let logo_fails: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.category == AuditCategory::Logo && r.status == CheckStatus::Fail)
        .collect();
    assert_eq!(logo_fails.len(), 1);
    assert_eq!(logo_fails[0].severity, Severity::Medium);
    assert!(logo_fails[0].message.contains("colors deviating"));
    assert!(report
        .results
        .iter()
        .all(|r| !(r.category == AuditCategory::Palette && r.status == CheckStatus::Fail)));
}

/// A typeface without a specimen is skipped and surfaced as a note, never
/// as a failure.
#[tokio::test]
async fn unreferenced_typeface_yields_note_not_failure() {
    let mut kit = BrandKit::new("Acme");
    kit.typography.push(FontSpec::new("Acme Sans"));
    let kit = Arc::new(kit);
    let images = onbrand_audit::ReferenceImages::new();
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let engine = engine(Arc::new(UnsureClassifier), embedder);
    let mut page = blank_page(1);
    page.text_blocks.push(TextBlock {
        region: BoundingBox::new(10, 10, 100, 20),
        text: "Hello".into(),
    });
    let document = DocumentInput::new("prose.pdf", vec![page]);
    let report = engine
        .audit(document, kit, cache, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.notes.len(), 1);
    assert_eq!(report.notes[0].kind, NoteKind::ReferenceMissing);
    assert_eq!(report.notes[0].subject, "Acme Sans");
    assert_eq!(report.summary.failed, 0);
    assert!(report
        .results
        .iter()
        .all(|r| r.category != AuditCategory::Typography));
}

/// A token cancelled before the run starts aborts with no partial report.
#[tokio::test]
async fn pre_cancelled_token_discards_the_run() {
    let (kit, images) = kit_with_logo(&noise_image(64, 64, 5), &[]);
    let kit = Arc::new(kit);
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let engine = engine(Arc::new(UnsureClassifier), embedder);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let document = DocumentInput::new("doc.pdf", vec![blank_page(1), blank_page(2)]);
    let result = engine.audit(document, kit, cache, cancel).await;
    assert_matches!(result, Err(AuditError::Cancelled));
}

/// Zero pages is a malformed document, not an empty report.
#[tokio::test]
async fn empty_document_is_rejected() {
    let kit = Arc::new(BrandKit::new("Acme"));
    let images = onbrand_audit::ReferenceImages::new();
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let engine = engine(Arc::new(UnsureClassifier), embedder);
    let result = engine
        .audit(
            DocumentInput::new("empty.pdf", vec![]),
            kit,
            cache,
            CancellationToken::new(),
        )
        .await;
    assert_matches!(result, Err(AuditError::MalformedDocument { name, .. }) if name == "empty.pdf");
}

/// An embedder outage during one page's typography check produces a single
/// inconclusive record there and leaves the rest of the document alone.
#[tokio::test]
async fn typography_embedder_outage_isolates_to_one_page() {
    let mut kit = BrandKit::new("Acme");
    kit.typography
        .push(FontSpec::new("Acme Grotesk").with_reference());
    let kit = Arc::new(kit);
    let mut images = onbrand_audit::ReferenceImages::new();
    images.add_glyphs("Acme Grotesk", glyph_strip());
    let good = FixedEmbedder(vec![1.0, 0.0]);
    let cache = cache_for(&kit, &images, &good).await;

    let engine = engine(Arc::new(UnsureClassifier), Arc::new(FailingEmbedder));

    let strip = glyph_strip();
    let mut page_image = RgbImage::from_pixel(320, 240, image::Rgb([255, 255, 255]));
    image::imageops::replace(&mut page_image, &strip, 20, 20);
    let page1 = PageInput {
        page_number: 1,
        image: DynamicImage::ImageRgb8(page_image),
        text_blocks: vec![TextBlock {
            region: BoundingBox::new(20, 20, 30, 12),
            text: "abc".into(),
        }],
        image_regions: Vec::new(),
    };
    let document = DocumentInput::new("outage.pdf", vec![page1, blank_page(2)]);
    let report = engine
        .audit(document, kit, cache, CancellationToken::new())
        .await
        .unwrap();

    let inconclusive: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.status == CheckStatus::Inconclusive)
        .collect();
    assert_eq!(inconclusive.len(), 1);
    assert_eq!(inconclusive[0].category, AuditCategory::Typography);
    assert_eq!(inconclusive[0].page, 1);
    assert_eq!(report.summary.failed, 0);
}

/// All four auditors live on one page: registered logo, on-brand text,
/// clean background, and an on-tone photograph.
#[tokio::test]
async fn full_page_with_all_four_auditors_passes() {
    let logo = noise_image(64, 64, 5);
    let (mut kit, mut images) = kit_with_logo(&logo, &["#112233"]);
    kit.typography
        .push(FontSpec::new("Acme Grotesk").with_reference());
    kit.brand_voice.attributes = vec!["warm".into()];
    images.add_glyphs("Acme Grotesk", glyph_strip());
    let kit = Arc::new(kit);
    let embedder: Arc<dyn Embedder> = Arc::new(InkEmbedder);
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;

    let mut photo = noise_image(80, 60, 9);
    photo.put_pixel(0, 0, PHOTO_MARKER);
    let strip = glyph_strip();

    let mut page_image = RgbImage::from_pixel(320, 240, image::Rgb([255, 255, 255]));
    image::imageops::replace(&mut page_image, &logo, 20, 30);
    image::imageops::replace(&mut page_image, &photo, 200, 60);
    image::imageops::replace(&mut page_image, &strip, 20, 160);
    let page = PageInput {
        page_number: 1,
        image: DynamicImage::ImageRgb8(page_image),
        text_blocks: vec![TextBlock {
            region: BoundingBox::new(20, 160, 30, 12),
            text: "abc".into(),
        }],
        image_regions: vec![
            BoundingBox::new(20, 30, 64, 64),
            BoundingBox::new(200, 60, 80, 60),
        ],
    };

    let engine = engine(Arc::new(MarkerClassifier), embedder);
    let document = DocumentInput::new("flagship.pdf", vec![page]);
    let report = engine
        .audit(document, kit, cache, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.inconclusive, 0);
    for category in [
        AuditCategory::Logo,
        AuditCategory::Typography,
        AuditCategory::Palette,
        AuditCategory::Imagery,
    ] {
        assert!(
            report
                .results
                .iter()
                .any(|r| r.category == category && r.status == CheckStatus::Pass),
            "no passing {category} record"
        );
    }
    let imagery: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.category == AuditCategory::Imagery)
        .collect();
    assert_eq!(imagery.len(), 1);
    assert_eq!(imagery[0].region, Some(BoundingBox::new(200, 60, 80, 60)));
}

/// Two runs over the same inputs render the same report, regardless of
/// which page task finishes first.
#[tokio::test]
async fn identical_inputs_produce_identical_reports() {
    let logo = noise_image(64, 64, 5);
    let (kit, images) = kit_with_logo(&logo, &["#112233", "#C8281E"]);
    let kit = Arc::new(kit);
    let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0]));
    let cache = cache_for(&kit, &images, embedder.as_ref()).await;
    let engine = engine(Arc::new(UnsureClassifier), embedder);

    let make_document = || {
        DocumentInput::new(
            "multi.pdf",
            vec![
                page_with_figure(1, &recolor(&logo), 60, 40),
                blank_page(2),
                page_with_figure(3, &logo, 100, 80),
            ],
        )
    };
    let a = engine
        .audit(
            make_document(),
            Arc::clone(&kit),
            Arc::clone(&cache),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    let b = engine
        .audit(make_document(), kit, cache, CancellationToken::new())
        .await
        .unwrap();

    let key = |report: &AuditReport| -> Vec<_> {
        report
            .results
            .iter()
            .map(|r| {
                (
                    r.category,
                    r.status,
                    r.severity,
                    r.page,
                    r.message.clone(),
                    r.region,
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&a), key(&b));
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.summary.failed, 1);
}
