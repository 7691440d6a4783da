//! Database setup, status counts, and manual reset.

use anyhow::{Context, Result};

use annot_reconcile::ReconcileConfig;
use annot_reconcile::db::AnnotationDb;
use annot_reconcile::db::models::StatusCounts;
use annot_reconcile::reconcile::reset_unit;

pub fn cmd_init(config: &ReconcileConfig) -> Result<()> {
    let path = &config.storage.database;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    AnnotationDb::new(path)?;
    println!("Database initialized at {}", path.display());
    Ok(())
}

pub fn cmd_status(config: &ReconcileConfig) -> Result<()> {
    let db = super::open_db(config)?;
    let (jobs, units, assemblies) = db.status_counts()?;

    println!();
    println!(
        "{:<16} {:>8} {:>10} {:>8} {:>8} {:>8}",
        "", "Unknown", "Submitted", "Success", "Failed", "Total"
    );
    print_row("Jobs", &jobs);
    print_row("Sequence units", &units);
    print_row("Assemblies", &assemblies);
    println!();
    Ok(())
}

fn print_row(label: &str, counts: &StatusCounts) {
    println!(
        "{:<16} {:>8} {:>10} {:>8} {:>8} {:>8}",
        label,
        counts.unknown,
        counts.submitted,
        counts.success,
        counts.failed,
        counts.total()
    );
}

pub fn cmd_reset(config: &ReconcileConfig, accession: &str) -> Result<()> {
    let db = super::open_db(config)?;
    if db.sequence_unit(accession)?.is_none() {
        anyhow::bail!("Sequence unit {} not found", accession);
    }
    let count = reset_unit(&db, accession)?;
    println!("Reset {} job(s) for {}", count, accession);
    Ok(())
}
