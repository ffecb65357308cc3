//! Audit findings and the data-quality side channel.
//!
//! Every check on every page produces an [`InspectionResult`]: a pass, a
//! fail with a violation severity, or an inconclusive marker when the check
//! could not run to completion. Constructors are the only sane way to build
//! one; they keep severity and status from contradicting each other.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::types::EntityId;

// ---------------------------------------------------------------------------
// Categories, severities, statuses
// ---------------------------------------------------------------------------

/// The four audit dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Logo,
    Palette,
    Typography,
    Imagery,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Logo => "logo",
            AuditCategory::Palette => "palette",
            AuditCategory::Typography => "typography",
            AuditCategory::Imagery => "imagery",
        }
    }

    /// Report ordering: identity problems first, mood problems last.
    pub fn priority(&self) -> u8 {
        match self {
            AuditCategory::Logo => 0,
            AuditCategory::Typography => 1,
            AuditCategory::Palette => 2,
            AuditCategory::Imagery => 3,
        }
    }
}

impl std::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bad a finding is. `Pass` is the severity of non-failing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Medium,
    Low,
    Pass,
}

impl Severity {
    pub fn weight(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::Medium => 3,
            Severity::Low => 2,
            Severity::Pass => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Pass => "pass",
        }
    }
}

/// Severity of a failing record. Converting into [`Severity`] can never
/// produce `Pass`, which is what keeps the fail constructor honest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationLevel {
    Critical,
    Medium,
    Low,
}

impl From<ViolationLevel> for Severity {
    fn from(level: ViolationLevel) -> Self {
        match level {
            ViolationLevel::Critical => Severity::Critical,
            ViolationLevel::Medium => Severity::Medium,
            ViolationLevel::Low => Severity::Low,
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Fail,
    /// The check ran into missing references or a collaborator failure and
    /// could not decide either way.
    Inconclusive,
    Pass,
}

impl CheckStatus {
    /// Report ordering: failures surface first.
    pub fn rank(&self) -> u8 {
        match self {
            CheckStatus::Fail => 0,
            CheckStatus::Inconclusive => 1,
            CheckStatus::Pass => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// InspectionResult
// ---------------------------------------------------------------------------

/// One finding on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionResult {
    pub id: EntityId,
    pub category: AuditCategory,
    pub severity: Severity,
    pub status: CheckStatus,
    pub message: String,
    /// One-based page number.
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingBox>,
}

impl InspectionResult {
    pub fn pass(category: AuditCategory, page: u32, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            category,
            severity: Severity::Pass,
            status: CheckStatus::Pass,
            message: message.into(),
            page,
            region: None,
        }
    }

    pub fn fail(
        category: AuditCategory,
        level: ViolationLevel,
        page: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            category,
            severity: level.into(),
            status: CheckStatus::Fail,
            message: message.into(),
            page,
            region: None,
        }
    }

    pub fn inconclusive(category: AuditCategory, page: u32, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            category,
            severity: Severity::Pass,
            status: CheckStatus::Inconclusive,
            message: message.into(),
            page,
            region: None,
        }
    }

    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.region = Some(region);
        self
    }

    /// Severity and status must agree: passing and inconclusive records
    /// carry no violation severity, failing records always do.
    pub fn invariant_holds(&self) -> bool {
        match self.status {
            CheckStatus::Pass => self.severity == Severity::Pass,
            CheckStatus::Fail => self.severity != Severity::Pass,
            CheckStatus::Inconclusive => self.severity == Severity::Pass,
        }
    }
}

// ---------------------------------------------------------------------------
// Data-quality notes
// ---------------------------------------------------------------------------

/// Why a note was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A registered reference (font specimen, logo asset) was absent, so
    /// part of the audit was skipped.
    ReferenceMissing,
    /// Extraction produced suspiciously little structured data.
    LowYield,
    /// Two ingested swatches were close enough to be the same color.
    NearDuplicateSwatch,
}

/// Ingestion and audit telemetry that is neither a violation nor a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityNote {
    pub kind: NoteKind,
    /// What the note is about (a font family, a file name, a hex pair).
    pub subject: String,
    pub detail: String,
}

impl DataQualityNote {
    pub fn new(kind: NoteKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}
