//! Job-state writes for one sequence unit.
//!
//! Both operations commit atomically per unit and are idempotent: applying the
//! same verdicts twice, or resetting twice, leaves the same state.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::{info, warn};

use crate::db::AnnotationDb;
use crate::db::models::{JobKind, JobStatus, JobUpdate};
use crate::summary::ResultSummary;
use crate::verify::Verdict;

/// Write artifact verdicts and reported digests to every job of `accession`.
/// Returns the number of jobs now marked Success.
pub fn apply_verdicts(
    db: &AnnotationDb,
    accession: &str,
    verdicts: &BTreeMap<JobKind, Verdict>,
    summary: &ResultSummary,
) -> Result<usize> {
    let mut updates = HashMap::new();
    for (kind, verdict) in verdicts {
        let status = if verdict.is_success() {
            JobStatus::Success
        } else {
            warn!(accession, job = %kind, %verdict, "job left for re-submission");
            JobStatus::Unknown
        };
        let content_hash = summary.for_job(*kind).map(|record| record.digest.clone());
        updates.insert(
            *kind,
            JobUpdate {
                status,
                content_hash,
            },
        );
    }

    let succeeded = db.apply_job_updates(accession, &updates)?;
    info!(accession, succeeded, "job verdicts recorded");
    Ok(succeeded)
}

/// Return every job of `accession` to Unknown, whatever its current state.
pub fn reset_unit(db: &AnnotationDb, accession: &str) -> Result<usize> {
    let count = db.reset_jobs(accession)?;
    info!(accession, jobs = count, "unit reset");
    Ok(count)
}
