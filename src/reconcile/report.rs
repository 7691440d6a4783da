//! What one reconciliation pass observed and changed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why every job of a unit was returned to Unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ResetReason {
    /// The captured log has no result-summary block
    NoSummary,
    /// The chromosome's stored checksum differs from the reference
    ChecksumMismatch { expected: String, found: String },
    /// The checksum step could not run
    ChecksumUnavailable { message: String },
    /// Anything else that went wrong while processing the unit
    Error { message: String },
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSummary => write!(f, "no result summary in captured output"),
            Self::ChecksumMismatch { expected, found } => {
                write!(f, "checksum mismatch (expected {}, found {})", expected, found)
            }
            Self::ChecksumUnavailable { message } => write!(f, "checksum unavailable: {}", message),
            Self::Error { message } => write!(f, "error: {}", message),
        }
    }
}

/// Per-unit outcome of the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Verdicts were written; `succeeded` jobs are now Success
    Verified { succeeded: usize },
    Reset(ResetReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedUnit {
    pub accession: String,
    pub succeeded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetUnit {
    pub accession: String,
    #[serde(flatten)]
    pub reason: ResetReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Submitted accessions the scheduler still lists
    pub running: Vec<String>,
    /// Submitted accessions the scheduler no longer lists
    pub finished: Vec<String>,
    pub verified: Vec<VerifiedUnit>,
    pub reset: Vec<ResetUnit>,
    /// Sequence units newly marked complete
    pub units_completed: Vec<String>,
    /// Assemblies newly marked complete
    pub assemblies_completed: Vec<String>,
    /// Assemblies whose directory was created this pass
    pub consolidated: Vec<String>,
}

impl PassReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            running: Vec::new(),
            finished: Vec::new(),
            verified: Vec::new(),
            reset: Vec::new(),
            units_completed: Vec::new(),
            assemblies_completed: Vec::new(),
            consolidated: Vec::new(),
        }
    }

    pub fn record(&mut self, accession: &str, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Verified { succeeded } => self.verified.push(VerifiedUnit {
                accession: accession.to_string(),
                succeeded,
            }),
            UnitOutcome::Reset(reason) => self.reset.push(ResetUnit {
                accession: accession.to_string(),
                reason,
            }),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whether the pass changed nothing beyond re-confirming existing state.
    pub fn is_quiet(&self) -> bool {
        self.finished.is_empty()
            && self.units_completed.is_empty()
            && self.assemblies_completed.is_empty()
            && self.consolidated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sorts_outcomes() {
        let mut report = PassReport::start();
        report.record("CM000001", UnitOutcome::Verified { succeeded: 4 });
        report.record("CM000002", UnitOutcome::Reset(ResetReason::NoSummary));
        assert_eq!(report.verified.len(), 1);
        assert_eq!(report.reset[0].accession, "CM000002");
        assert_eq!(report.reset[0].reason, ResetReason::NoSummary);
    }

    #[test]
    fn test_report_serializes_reset_reason_inline() {
        let mut report = PassReport::start();
        report.record(
            "CM000002",
            UnitOutcome::Reset(ResetReason::ChecksumMismatch {
                expected: "aa".into(),
                found: "bb".into(),
            }),
        );
        report.finish();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reset"][0]["accession"], "CM000002");
        assert_eq!(json["reset"][0]["reason"], "checksum_mismatch");
        assert_eq!(json["reset"][0]["expected"], "aa");
        assert!(json["finished_at"].is_string());
    }

    #[test]
    fn test_fresh_report_is_quiet() {
        assert!(PassReport::start().is_quiet());
    }
}
