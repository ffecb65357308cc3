//! Pure domain logic for the onbrand compliance engine.
//!
//! Everything in this crate is synchronous and side-effect free: data model
//! types with their wire shapes, color math, geometry, local-feature
//! detection and matching, image quality heuristics, page sampling, and the
//! inspection-record/aggregation model. Orchestration, model inference, and
//! I/O live in the sibling crates; they pass data in and get data back.

pub mod aggregate;
pub mod asset;
pub mod brand_kit;
pub mod color;
pub mod error;
pub mod font;
pub mod geometry;
pub mod hashing;
pub mod inspection;
pub mod keypoints;
pub mod logo_rule;
pub mod quality;
pub mod sampling;
pub mod swatch;
pub mod typography;
pub mod types;
