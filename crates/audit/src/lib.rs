//! Page-by-page brand compliance audits.
//!
//! Consumes an immutable [`onbrand_core::brand_kit::BrandKit`] plus the
//! rendered pages of a document under review and produces an ordered
//! [`onbrand_core::aggregate::AuditReport`]. Four auditors run per page
//! (logo usage, typography, color palette, imagery style); pages fan out
//! concurrently behind a semaphore and the run honors cancellation at
//! page boundaries.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;

mod imagery;
mod logo;
mod palette;
mod typography;

pub use cache::{ReferenceCache, ReferenceImages};
pub use config::AuditConfig;
pub use engine::AuditEngine;
pub use error::AuditError;
pub use input::{DocumentInput, PageInput, TextBlock};
