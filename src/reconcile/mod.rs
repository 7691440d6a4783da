//! Reconciliation driver.
//!
//! One pass:
//! 1. ask the scheduler which accessions are still running,
//! 2. take the submitted accessions from the store and drop the running ones,
//! 3. for each finished accession, read the result summary from its captured
//!    output, verify the chromosome checksum when the unit is a chromosome,
//!    inspect artifacts, and write verdicts, or reset the unit,
//! 4. roll job state up to sequence units and assemblies,
//! 5. consolidate newly complete assemblies on disk.
//!
//! Per-accession failures never abort the pass; they reset that unit. Failures
//! of the scheduler query, of a reset, of aggregation, or of consolidation do.

mod report;
mod updater;

pub use report::{PassReport, ResetReason, ResetUnit, UnitOutcome, VerifiedUnit};
pub use updater::{apply_verdicts, reset_unit};

use std::collections::HashSet;

use anyhow::Context;
use tracing::{error, info, warn};

use crate::aggregate::aggregate;
use crate::config::ReconcileConfig;
use crate::consolidate::consolidate;
use crate::db::AnnotationDb;
use crate::db::models::UnitKind;
use crate::errors::ReconcileError;
use crate::layout::ResultsLayout;
use crate::scheduler::Scheduler;
use crate::summary::SummaryParser;
use crate::verify::{IntegrityOutcome, inspect_artifacts, verify_checksum};

pub struct Reconciler<'a> {
    db: &'a AnnotationDb,
    scheduler: &'a dyn Scheduler,
    layout: ResultsLayout,
    parser: SummaryParser,
    checksum_len: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a AnnotationDb, scheduler: &'a dyn Scheduler, config: &ReconcileConfig) -> Self {
        Self {
            db,
            scheduler,
            layout: ResultsLayout::new(
                config.storage.results_dir.clone(),
                config.summary.stdout_file.clone(),
            ),
            parser: SummaryParser::new(config.summary.checksum_tag_len),
            checksum_len: config.summary.checksum_len,
        }
    }

    /// Run the driver, the aggregator, and the consolidator once.
    pub fn run_pass(&self) -> Result<PassReport, ReconcileError> {
        let mut report = PassReport::start();

        let running = self.scheduler.running_accessions()?;
        let finished = self.finished_accessions(&running)?;
        let mut running: Vec<String> = running.into_iter().collect();
        running.sort();
        info!(
            running = running.len(),
            finished = finished.len(),
            "reconciliation pass started"
        );
        report.running = running;

        for accession in &finished {
            let outcome = self.reconcile_accession(accession)?;
            report.record(accession, outcome);
        }
        report.finished = finished;

        let rollup = aggregate(self.db)?;
        report.units_completed = rollup.units_completed;
        report.assemblies_completed = rollup.assemblies_completed;

        report.consolidated = consolidate(self.db, &self.layout, &rollup.complete_assemblies)?;

        report.finish();
        info!(
            verified = report.verified.len(),
            reset = report.reset.len(),
            units_completed = report.units_completed.len(),
            assemblies_completed = report.assemblies_completed.len(),
            consolidated = report.consolidated.len(),
            "reconciliation pass finished"
        );
        Ok(report)
    }

    /// Submitted accessions the scheduler no longer lists, in sorted order.
    pub fn finished_accessions(
        &self,
        running: &HashSet<String>,
    ) -> Result<Vec<String>, ReconcileError> {
        let submitted = self.db.submitted_accessions()?;
        Ok(submitted
            .into_iter()
            .filter(|accession| !running.contains(accession))
            .collect())
    }

    /// Reconcile one finished accession. Any failure while examining the unit
    /// turns into a reset; only a failing reset is returned as an error.
    pub fn reconcile_accession(&self, accession: &str) -> Result<UnitOutcome, ReconcileError> {
        let outcome = match self.examine(accession) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("{:#}", e);
                error!(accession, error = %message, "failed to reconcile unit");
                UnitOutcome::Reset(ResetReason::Error { message })
            }
        };

        if let UnitOutcome::Reset(reason) = &outcome {
            warn!(accession, %reason, "resetting unit");
            reset_unit(self.db, accession)?;
        }
        Ok(outcome)
    }

    fn examine(&self, accession: &str) -> anyhow::Result<UnitOutcome> {
        let unit = self
            .db
            .sequence_unit(accession)?
            .ok_or_else(|| ReconcileError::UnknownUnit {
                accession: accession.to_string(),
            })?;

        let log_path = self.layout.stdout_log(accession);
        let log = std::fs::read_to_string(&log_path)
            .with_context(|| format!("Failed to read captured output {}", log_path.display()))?;
        let Some(summary) = self
            .parser
            .parse(&log)
            .with_context(|| format!("Malformed result summary in {}", log_path.display()))?
        else {
            return Ok(UnitOutcome::Reset(ResetReason::NoSummary));
        };

        if unit.kind == UnitKind::Chromosome {
            match verify_checksum(
                &self.layout,
                accession,
                unit.reference_md5.as_deref(),
                self.checksum_len,
            ) {
                Ok(IntegrityOutcome::Match) => {}
                Ok(IntegrityOutcome::Mismatch { expected, found }) => {
                    return Ok(UnitOutcome::Reset(ResetReason::ChecksumMismatch {
                        expected,
                        found,
                    }));
                }
                Err(e) => {
                    return Ok(UnitOutcome::Reset(ResetReason::ChecksumUnavailable {
                        message: e.to_string(),
                    }));
                }
            }
        }

        let verdicts = inspect_artifacts(&self.layout, accession, &summary);
        let succeeded = apply_verdicts(self.db, accession, &verdicts, &summary)?;
        Ok(UnitOutcome::Verified { succeeded })
    }
}
