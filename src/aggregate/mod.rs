//! Roll job state up to sequence units and assemblies.
//!
//! Two passes, each committed as one transaction:
//! - units: a sequence unit is complete when it has a job of every kind and
//!   every one of them is Success. A complete scaffold unit also completes its
//!   assembly directly.
//! - assemblies: an assembly is complete when it has members and every member
//!   unit is complete.
//!
//! Completeness is an `all(Success)` test over explicit statuses; Unknown,
//! Submitted, and Failed all block it, as does a missing record. The
//! aggregator only ever promotes to Success, never demotes.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::db::AnnotationDb;
use crate::db::models::{Job, JobKind, JobStatus, SequenceUnit, UnitKind};

/// What the two rollup passes found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollup {
    /// Sequence units that became complete in this pass
    pub units_completed: Vec<String>,
    /// Assemblies that became complete in this pass
    pub assemblies_completed: Vec<String>,
    /// Every complete assembly with chromosome members, newly complete or not
    pub complete_assemblies: Vec<String>,
}

/// Whether a unit's jobs cover every kind and all succeeded.
pub fn unit_complete(jobs: &[Job]) -> bool {
    let succeeded: BTreeSet<JobKind> = jobs
        .iter()
        .filter(|job| job.status.is_success())
        .map(|job| job.kind)
        .collect();
    !jobs.is_empty()
        && jobs.iter().all(|job| job.status.is_success())
        && JobKind::ALL.iter().all(|kind| succeeded.contains(kind))
}

/// Whether every member of an assembly is complete.
pub fn assembly_complete(members: &[SequenceUnit]) -> bool {
    !members.is_empty() && members.iter().all(|unit| unit.status.is_success())
}

/// Run both rollup passes.
pub fn aggregate(db: &AnnotationDb) -> Result<Rollup> {
    // Scaffold units promote their assembly in pass 1, so newness is judged
    // against the statuses seen before either pass.
    let already_complete: BTreeSet<String> = db
        .assemblies()?
        .into_iter()
        .filter(|assembly| assembly.status.is_success())
        .map(|assembly| assembly.accession)
        .collect();

    let units_completed = roll_up_units(db)?;
    let (assemblies_completed, complete_assemblies) =
        roll_up_assemblies(db, &already_complete)?;
    Ok(Rollup {
        units_completed,
        assemblies_completed,
        complete_assemblies,
    })
}

/// Pass 1: jobs to sequence units. Returns units newly marked complete.
fn roll_up_units(db: &AnnotationDb) -> Result<Vec<String>> {
    let units: BTreeMap<String, SequenceUnit> = db
        .sequence_units()?
        .into_iter()
        .map(|unit| (unit.accession.clone(), unit))
        .collect();

    let mut jobs_by_unit: BTreeMap<String, Vec<Job>> = BTreeMap::new();
    for job in db.all_jobs()? {
        jobs_by_unit.entry(job.accession.clone()).or_default().push(job);
    }

    let mut complete_units = Vec::new();
    let mut scaffold_assemblies = Vec::new();
    let mut newly = Vec::new();
    for (accession, jobs) in &jobs_by_unit {
        if !unit_complete(jobs) {
            continue;
        }
        let Some(unit) = units.get(accession) else {
            warn!(accession = %accession, "complete jobs belong to no sequence unit");
            continue;
        };
        if unit.status != JobStatus::Success {
            newly.push(accession.clone());
        }
        complete_units.push(accession.clone());
        if unit.kind == UnitKind::Scaffold {
            scaffold_assemblies.push(unit.assembly_accession.clone());
        }
    }

    db.set_rollup_statuses(&complete_units, &scaffold_assemblies, JobStatus::Success)?;
    debug!(
        complete = complete_units.len(),
        newly = newly.len(),
        "sequence unit rollup committed"
    );
    Ok(newly)
}

/// Pass 2: sequence units to assemblies. Returns assemblies newly marked
/// complete, and all complete assemblies that have chromosome members.
fn roll_up_assemblies(
    db: &AnnotationDb,
    already_complete: &BTreeSet<String>,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut members: BTreeMap<String, Vec<SequenceUnit>> = BTreeMap::new();
    for unit in db.sequence_units()? {
        members
            .entry(unit.assembly_accession.clone())
            .or_default()
            .push(unit);
    }

    let mut newly = Vec::new();
    let mut complete = Vec::new();
    let mut with_chromosomes = Vec::new();
    for assembly in db.assemblies()? {
        let Some(units) = members.get(&assembly.accession) else {
            continue;
        };
        if !assembly_complete(units) {
            continue;
        }
        if !already_complete.contains(&assembly.accession) {
            info!(assembly = %assembly.accession, "assembly complete");
            newly.push(assembly.accession.clone());
        }
        if units.iter().any(|unit| unit.kind == UnitKind::Chromosome) {
            with_chromosomes.push(assembly.accession.clone());
        }
        complete.push(assembly.accession);
    }

    db.set_rollup_statuses(&[], &complete, JobStatus::Success)?;
    debug!(
        complete = complete.len(),
        newly = newly.len(),
        "assembly rollup committed"
    );
    Ok((newly, with_chromosomes))
}
