//! One reconciliation pass: `annot-reconcile run`.

use anyhow::{Context, Result};

use annot_reconcile::{LsfScheduler, PassReport, ReconcileConfig, Reconciler};

pub fn cmd_run(config: &ReconcileConfig, json: bool) -> Result<()> {
    let db = super::open_db(config)?;
    let scheduler = LsfScheduler::from_config(&config.scheduler)?;
    let report = Reconciler::new(&db, &scheduler, config).run_pass()?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PassReport) {
    println!();
    println!(
        "Submitted units: {} still running, {} finished",
        report.running.len(),
        report.finished.len()
    );

    if !report.verified.is_empty() {
        println!();
        println!("{}", console::style("Verified").green().bold());
        for unit in &report.verified {
            println!("  {:<20} {}/4 jobs succeeded", unit.accession, unit.succeeded);
        }
    }

    if !report.reset.is_empty() {
        println!();
        println!("{}", console::style("Reset").yellow().bold());
        for unit in &report.reset {
            println!("  {:<20} {}", unit.accession, unit.reason);
        }
    }

    if !report.units_completed.is_empty() || !report.assemblies_completed.is_empty() {
        println!();
        println!("{}", console::style("Completed").green().bold());
        for accession in &report.units_completed {
            println!("  unit      {}", accession);
        }
        for accession in &report.assemblies_completed {
            println!("  assembly  {}", accession);
        }
    }

    if !report.consolidated.is_empty() {
        println!();
        println!("Consolidated: {}", report.consolidated.join(", "));
    }

    if report.is_quiet() {
        println!();
        println!("{}", console::style("Nothing to reconcile.").dim());
    }
    println!();
}
