//! Headless pipeline runner.
//!
//! Drives the two halves of the system from the command line:
//!
//! ```text
//! onbrand-runner build-kit <manifest.json>   assemble a brand kit from guideline documents
//! onbrand-runner audit <manifest.json>       audit a document against a built kit
//! ```
//!
//! A manifest is a JSON file describing pre-rendered inputs on local disk
//! (page rasters, OCR text, layout boxes); rasterization itself happens
//! upstream. Image paths inside a manifest are resolved relative to the
//! manifest file, and the resulting kit or audit report is printed to
//! stdout as pretty JSON so the runner composes with shell pipelines.
//!
//! Requires `ONBRAND_INFERENCE_URL` pointing at the inference sidecar;
//! all other settings are optional (see `IngestConfig` / `AuditConfig`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onbrand_audit::{
    AuditConfig, AuditEngine, DocumentInput, PageInput, ReferenceCache, ReferenceImages, TextBlock,
};
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::geometry::BoundingBox;
use onbrand_core::types::EntityId;
use onbrand_inference::{Classifier, Embedder, GuidelineModel, HttpInference};
use onbrand_kit::{BrandKitBuilder, IngestConfig, SourceDocument, SourcePage};

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

/// `build-kit` input: a kit title plus the documents feeding it.
#[derive(Debug, Deserialize)]
struct BuildManifest {
    title: String,
    documents: Vec<ManifestDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ManifestDocument {
    /// A rendered guideline document: one raster, text, and candidate
    /// figure regions per page.
    Guidelines {
        name: String,
        pages: Vec<ManifestPage>,
    },
    /// A glyph specimen image registering one typeface.
    GlyphReference {
        name: String,
        family: String,
        image: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ManifestPage {
    number: u32,
    image: PathBuf,
    #[serde(default)]
    text: String,
    #[serde(default)]
    regions: Vec<BoundingBox>,
}

/// `audit` input: the kit produced by `build-kit`, the document under
/// audit, and rasters for the kit's reference assets.
#[derive(Debug, Deserialize)]
struct AuditManifest {
    /// Path to the kit JSON written by `build-kit` (the `kit` field of
    /// its output).
    kit: PathBuf,
    document: ManifestAuditDocument,
    #[serde(default)]
    references: ReferenceManifest,
}

#[derive(Debug, Deserialize)]
struct ManifestAuditDocument {
    name: String,
    pages: Vec<ManifestAuditPage>,
}

#[derive(Debug, Deserialize)]
struct ManifestAuditPage {
    number: u32,
    image: PathBuf,
    #[serde(default)]
    text_blocks: Vec<ManifestTextBlock>,
    #[serde(default)]
    image_regions: Vec<BoundingBox>,
}

#[derive(Debug, Deserialize)]
struct ManifestTextBlock {
    region: BoundingBox,
    #[serde(default)]
    text: String,
}

/// Rasters backing the kit's logo assets and glyph references. Entries
/// the kit does not reference are ignored; kit entries without a raster
/// here are skipped by the cache with a warning.
#[derive(Debug, Default, Deserialize)]
struct ReferenceManifest {
    #[serde(default)]
    logos: Vec<LogoRaster>,
    #[serde(default)]
    glyphs: Vec<GlyphRaster>,
}

#[derive(Debug, Deserialize)]
struct LogoRaster {
    asset_id: EntityId,
    image: PathBuf,
}

#[derive(Debug, Deserialize)]
struct GlyphRaster {
    family: String,
    image: PathBuf,
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "onbrand_runner=info,onbrand_kit=info,onbrand_audit=info,onbrand_inference=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Arguments ---
    let mut args = std::env::args().skip(1);
    let (command, manifest_path) = match (args.next(), args.next()) {
        (Some(command), Some(path)) => (command, PathBuf::from(path)),
        _ => {
            eprintln!("usage: onbrand-runner <build-kit | audit> <manifest.json>");
            std::process::exit(2);
        }
    };

    // --- Inference client ---
    let inference_url =
        std::env::var("ONBRAND_INFERENCE_URL").context("ONBRAND_INFERENCE_URL must be set")?;
    let inference = Arc::new(HttpInference::new(inference_url));

    match command.as_str() {
        "build-kit" => build_kit(&manifest_path, inference).await,
        "audit" => audit_document(&manifest_path, inference).await,
        other => bail!("unknown command '{other}', expected 'build-kit' or 'audit'"),
    }
}

// ---------------------------------------------------------------------------
// build-kit
// ---------------------------------------------------------------------------

async fn build_kit(manifest_path: &Path, inference: Arc<HttpInference>) -> anyhow::Result<()> {
    let manifest: BuildManifest = read_json(manifest_path)?;
    let base = manifest_dir(manifest_path);

    let mut documents = Vec::with_capacity(manifest.documents.len());
    for doc in &manifest.documents {
        documents.push(load_source_document(doc, base)?);
    }
    tracing::info!(
        title = %manifest.title,
        documents = documents.len(),
        "Build manifest loaded"
    );

    let builder = BrandKitBuilder::new(
        Arc::clone(&inference) as Arc<dyn Classifier>,
        Arc::clone(&inference) as Arc<dyn GuidelineModel>,
        IngestConfig::from_env(),
    );
    let outcome = builder.build(manifest.title, &documents).await?;

    print_json(&serde_json::json!({
        "kit": outcome.kit,
        "warnings": outcome.warnings,
    }))
}

fn load_source_document(doc: &ManifestDocument, base: &Path) -> anyhow::Result<SourceDocument> {
    match doc {
        ManifestDocument::Guidelines { name, pages } => {
            let mut loaded = Vec::with_capacity(pages.len());
            for page in pages {
                loaded.push(SourcePage {
                    number: page.number,
                    image: load_rgb(&base.join(&page.image))?,
                    text: page.text.clone(),
                    regions: page.regions.clone(),
                });
            }
            Ok(SourceDocument::guidelines(name.clone(), loaded))
        }
        ManifestDocument::GlyphReference { name, family, image } => {
            Ok(SourceDocument::glyph_reference(
                name.clone(),
                family.clone(),
                load_rgb(&base.join(image))?,
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// audit
// ---------------------------------------------------------------------------

async fn audit_document(
    manifest_path: &Path,
    inference: Arc<HttpInference>,
) -> anyhow::Result<()> {
    let manifest: AuditManifest = read_json(manifest_path)?;
    let base = manifest_dir(manifest_path);

    let kit: BrandKit = read_json(&base.join(&manifest.kit))?;

    let mut images = ReferenceImages::new();
    for logo in &manifest.references.logos {
        images.add_logo(logo.asset_id, load_rgb(&base.join(&logo.image))?);
    }
    for glyph in &manifest.references.glyphs {
        images.add_glyphs(&glyph.family, load_rgb(&base.join(&glyph.image))?);
    }

    let mut pages = Vec::with_capacity(manifest.document.pages.len());
    for page in &manifest.document.pages {
        pages.push(PageInput {
            page_number: page.number,
            image: DynamicImage::ImageRgb8(load_rgb(&base.join(&page.image))?),
            text_blocks: page
                .text_blocks
                .iter()
                .map(|block| TextBlock {
                    region: block.region,
                    text: block.text.clone(),
                })
                .collect(),
            image_regions: page.image_regions.clone(),
        });
    }
    let document = DocumentInput::new(manifest.document.name, pages);
    tracing::info!(
        kit_id = %kit.id,
        document = %document.name,
        pages = document.pages.len(),
        "Audit manifest loaded"
    );

    let config = AuditConfig::from_env();
    let cache = ReferenceCache::build(&kit, &images, inference.as_ref(), &config).await?;

    // --- Shutdown wiring ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let engine = AuditEngine::new(
        config,
        Arc::clone(&inference) as Arc<dyn Classifier>,
        Arc::clone(&inference) as Arc<dyn Embedder>,
    );
    let report = engine
        .audit(document, Arc::new(kit), Arc::new(cache), cancel)
        .await?;

    print_json(&report)
}

/// Wait for a termination signal so an in-flight audit is cancelled
/// cleanly instead of killed mid-page.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the runner
/// behaves the same whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), cancelling audit");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, cancelling audit");
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory the manifest lives in; relative paths resolve against it.
fn manifest_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_rgb(path: &Path) -> anyhow::Result<RgbImage> {
    let image =
        image::open(path).with_context(|| format!("loading image {}", path.display()))?;
    Ok(image.to_rgb8())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
