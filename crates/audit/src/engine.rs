//! The audit engine: bounded page fan-out, region routing, report assembly.
//!
//! Pages are independent, so the engine spawns one task per page behind a
//! semaphore and collects results keyed by page number. Output ordering
//! never depends on completion order, and a cancelled run returns
//! [`AuditError::Cancelled`] instead of a partial report.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, RgbImage};
use onbrand_core::aggregate::{aggregate, AuditReport};
use onbrand_core::asset::{AssetCategory, CLASSIFIABLE};
use onbrand_core::brand_kit::BrandKit;
use onbrand_core::geometry::BoundingBox;
use onbrand_core::inspection::{AuditCategory, InspectionResult};
use onbrand_inference::{Classifier, Embedder};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::ReferenceCache;
use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::input::{crop_region, DocumentInput, PageInput};
use crate::palette::PaletteEntry;
use crate::{imagery, logo, palette, typography};

// ---------------------------------------------------------------------------
// Shared run state
// ---------------------------------------------------------------------------

/// Read-only state shared by every page task of one audit run.
pub(crate) struct AuditContext {
    pub config: AuditConfig,
    pub classifier: Arc<dyn Classifier>,
    pub embedder: Arc<dyn Embedder>,
    pub kit: Arc<BrandKit>,
    pub cache: Arc<ReferenceCache>,
    /// Category descriptors handed to the classifier for region routing.
    pub region_labels: Vec<String>,
    /// Kit palette parsed once per run.
    pub palette: Vec<PaletteEntry>,
}

enum PageOutcome {
    Done(u32, Vec<InspectionResult>),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs the four auditors over every page of a document.
pub struct AuditEngine {
    config: AuditConfig,
    classifier: Arc<dyn Classifier>,
    embedder: Arc<dyn Embedder>,
}

impl AuditEngine {
    pub fn new(
        config: AuditConfig,
        classifier: Arc<dyn Classifier>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            classifier,
            embedder,
        }
    }

    /// Audit one document against a kit and its reference cache.
    ///
    /// Cancellation is honored at page boundaries: pages already in flight
    /// run to completion but the run returns [`AuditError::Cancelled`] and
    /// discards their records.
    pub async fn audit(
        &self,
        document: DocumentInput,
        kit: Arc<BrandKit>,
        cache: Arc<ReferenceCache>,
        cancel: CancellationToken,
    ) -> Result<AuditReport, AuditError> {
        document.validate()?;
        // Kits arrive as deserialized JSON; re-check structure before
        // trusting them.
        kit.validate()?;
        if cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        let notes = typography::reference_notes(&kit);
        let context = Arc::new(AuditContext {
            config: self.config.clone(),
            classifier: Arc::clone(&self.classifier),
            embedder: Arc::clone(&self.embedder),
            palette: palette::parse_palette(&kit),
            region_labels: CLASSIFIABLE
                .iter()
                .map(|c| c.descriptor_text().to_string())
                .collect(),
            kit,
            cache,
        });

        let document_name = document.name;
        let page_count = document.pages.len();
        let started = Instant::now();
        info!(document = %document_name, pages = page_count, "audit started");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_pages.max(1)));
        let mut tasks = JoinSet::new();
        let mut cancelled = false;

        for page in document.pages {
            let permit = tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        cancelled = true;
                        break;
                    }
                },
            };
            let ctx = Arc::clone(&context);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                if cancel.is_cancelled() {
                    return PageOutcome::Cancelled;
                }
                let number = page.page_number;
                PageOutcome::Done(number, audit_page(&ctx, page).await)
            });
        }

        // Keyed by page number so completion order cannot leak into the
        // report.
        let mut by_page: BTreeMap<u32, Vec<InspectionResult>> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(PageOutcome::Done(number, records)) => {
                    by_page.insert(number, records);
                }
                Ok(PageOutcome::Cancelled) => cancelled = true,
                Err(e) => {
                    tasks.abort_all();
                    return Err(AuditError::Task(e.to_string()));
                }
            }
        }

        if cancelled || cancel.is_cancelled() {
            info!(document = %document_name, "audit cancelled");
            return Err(AuditError::Cancelled);
        }

        let results: Vec<InspectionResult> = by_page.into_values().flatten().collect();
        let report = aggregate(results, notes);
        info!(
            document = %document_name,
            total = report.summary.total,
            failed = report.summary.failed,
            inconclusive = report.summary.inconclusive,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "audit complete"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Per-page pipeline
// ---------------------------------------------------------------------------

/// Run the four auditors over one page, in report-priority order.
async fn audit_page(ctx: &AuditContext, page: PageInput) -> Vec<InspectionResult> {
    let number = page.page_number;
    let started = Instant::now();
    let rgb = page.image.to_rgb8();

    // Route embedded figures first: photographic regions feed the imagery
    // checks, and every region regardless of category is excluded from
    // background color sampling.
    let mut photo_regions = Vec::new();
    for region in &page.image_regions {
        if classify_region(ctx, &rgb, region).await == AssetCategory::Photograph {
            photo_regions.push(*region);
        }
    }

    let mut records = logo::audit_page(number, &rgb, &ctx.cache, &ctx.config);
    records.extend(typography::audit_page(ctx, number, &rgb, &page.text_blocks).await);
    records.extend(palette::audit_page(
        number,
        &rgb,
        &page.image_regions,
        &ctx.palette,
        &ctx.config,
    ));
    match imagery::audit_regions(ctx, number, &rgb, &photo_regions).await {
        Ok(mut imagery_records) => records.append(&mut imagery_records),
        Err(e) => {
            error!(page = number, error = %e, "imagery checks failed");
            records.push(InspectionResult::inconclusive(
                AuditCategory::Imagery,
                number,
                format!("Imagery checks could not run: {e}"),
            ));
        }
    }

    debug!(
        page = number,
        records = records.len(),
        photos = photo_regions.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "page audited"
    );
    records
}

/// Classify one embedded figure for routing. Anything below the confidence
/// floor, off the page, or failing the classifier stays `Unknown`.
async fn classify_region(
    ctx: &AuditContext,
    page: &RgbImage,
    region: &BoundingBox,
) -> AssetCategory {
    let Some(crop) = crop_region(page, region) else {
        return AssetCategory::Unknown;
    };
    match ctx
        .classifier
        .classify(&DynamicImage::ImageRgb8(crop), &ctx.region_labels)
        .await
    {
        Ok(winner) if winner.score >= ctx.config.classifier_min_confidence => {
            AssetCategory::from_descriptor(&winner.label).unwrap_or(AssetCategory::Unknown)
        }
        Ok(_) => AssetCategory::Unknown,
        Err(e) => {
            warn!(error = %e, "region classification failed");
            AssetCategory::Unknown
        }
    }
}
