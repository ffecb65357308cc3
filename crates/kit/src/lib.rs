//! Brand kit ingestion.
//!
//! Turns uploaded guideline documents (rendered pages, OCR text, region
//! crops) into an immutable [`onbrand_core::brand_kit::BrandKit`]: regions
//! are classified into assets, structured facts are extracted from the
//! text, palettes are deduplicated, and data-quality warnings are
//! collected alongside.

pub mod builder;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod source;

pub use builder::{BrandKitBuilder, BuildOutcome};
pub use config::IngestConfig;
pub use error::IngestError;
pub use source::{SourceDocument, SourceKind, SourcePage};
