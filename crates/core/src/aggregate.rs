//! Report assembly: deterministic ordering plus summary counts.

use serde::{Deserialize, Serialize};

use crate::inspection::{CheckStatus, DataQualityNote, InspectionResult};

/// Roll-up counts over a report's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub failed: usize,
    pub passed: usize,
    pub inconclusive: usize,
}

/// The finished audit: ordered findings, counts, and data-quality notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub results: Vec<InspectionResult>,
    pub summary: AuditSummary,
    pub notes: Vec<DataQualityNote>,
}

/// Order findings for presentation and compute the summary.
///
/// Sort keys, in order: category display priority, status (failures first),
/// severity weight descending, page ascending. The sort is stable, so
/// records that tie on every key keep their arrival order; two runs over
/// the same findings render identically.
pub fn aggregate(mut results: Vec<InspectionResult>, notes: Vec<DataQualityNote>) -> AuditReport {
    results.sort_by(|a, b| {
        a.category
            .priority()
            .cmp(&b.category.priority())
            .then_with(|| a.status.rank().cmp(&b.status.rank()))
            .then_with(|| b.severity.weight().cmp(&a.severity.weight()))
            .then_with(|| a.page.cmp(&b.page))
    });

    let mut summary = AuditSummary {
        total: results.len(),
        ..AuditSummary::default()
    };
    for r in &results {
        match r.status {
            CheckStatus::Fail => summary.failed += 1,
            CheckStatus::Pass => summary.passed += 1,
            CheckStatus::Inconclusive => summary.inconclusive += 1,
        }
    }

    AuditReport {
        results,
        summary,
        notes,
    }
}
