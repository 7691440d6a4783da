//! Integration tests for the annot-reconcile binary.
//!
//! The scheduler is replaced by `echo` through a config file, so a pass can run
//! without a cluster.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use annot_reconcile::AnnotationDb;
use annot_reconcile::db::models::{JobKind, JobStatus, UnitKind};

const MD5: &str = "0123456789abcdef0123456789abcdef";

/// Helper to create an annot-reconcile Command running inside `dir`
fn reconcile(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("annot-reconcile");
    cmd.current_dir(dir.path());
    cmd
}

/// Write a reconcile.toml whose scheduler listing is `listing`
fn write_config(dir: &TempDir, listing: &str) {
    let config = format!(
        r#"
[storage]
results_dir = "results"
database = "state/annotation.db"

[scheduler]
command = "echo"
args = ["{listing}"]
"#
    );
    fs::write(dir.path().join("reconcile.toml"), config).unwrap();
}

fn init(dir: &TempDir) {
    reconcile(dir).arg("init").assert().success();
}

fn seed_finished_chromosome(dir: &TempDir, accession: &str, assembly: &str) {
    let db = AnnotationDb::new(&dir.path().join("state/annotation.db")).unwrap();
    db.add_assembly(assembly).unwrap();
    db.add_sequence_unit(accession, UnitKind::Chromosome, assembly, Some(MD5))
        .unwrap();
    for kind in JobKind::ALL {
        db.add_job(accession, kind).unwrap();
    }
    db.mark_submitted(accession).unwrap();

    let unit = dir.path().join("results").join(accession);
    fs::create_dir_all(&unit).unwrap();
    for name in [
        format!("{accession}.wig"),
        format!("{accession}.CpG.txt"),
        format!("{accession}.fasta"),
        format!("{accession}.fasta.2.5.7.80.10.40.500.bed"),
        format!("{accession}.fasta.2.5.7.80.10.40.500.mask"),
        format!("{accession}.fasta.2.5.7.80.10.40.500.dat"),
    ] {
        fs::write(unit.join(name), "artifact").unwrap();
    }
    fs::write(unit.join(format!("{accession}.md5")), MD5).unwrap();
    fs::write(
        unit.join("stdout.txt"),
        r#"{
  "GCout": {"size": 120, "checksum": "sha1$abc123"},
  "TRF_bed_out": {"size": 64, "checksum": "sha1$bed000"},
  "CpG_out": {"size": 32, "checksum": "sha1$cpg000"},
  "fasta_out": {"size": 4096, "checksum": "sha1$fasta0"}
}"#,
    )
    .unwrap();
}

fn job_statuses(path: &Path, accession: &str) -> Vec<JobStatus> {
    AnnotationDb::new(path)
        .unwrap()
        .jobs_for(accession)
        .unwrap()
        .into_iter()
        .map(|job| job.status)
        .collect()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = TempDir::new().unwrap();
        reconcile(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("reconciliation pass"));
    }

    #[test]
    fn test_version() {
        let dir = TempDir::new().unwrap();
        reconcile(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_database() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");

        reconcile(&dir)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Database initialized"));

        assert!(dir.path().join("state/annotation.db").is_file());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);
        init(&dir);
    }

    #[test]
    fn test_database_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");

        reconcile(&dir)
            .args(["--database", "other.db", "init"])
            .assert()
            .success();

        assert!(dir.path().join("other.db").is_file());
        assert!(!dir.path().join("state/annotation.db").exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("reconcile.toml"),
            "[summary]\nchecksum_len = 0\n",
        )
        .unwrap();

        reconcile(&dir)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("checksum_len"));
    }
}

// =============================================================================
// Store Commands
// =============================================================================

mod store_commands {
    use super::*;

    #[test]
    fn test_status_without_database_fails() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");

        reconcile(&dir)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Database not found"));
    }

    #[test]
    fn test_status_shows_counts() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);
        seed_finished_chromosome(&dir, "CM000001", "GCA_000001");

        reconcile(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Jobs"))
            .stdout(predicate::str::contains("Sequence units"))
            .stdout(predicate::str::contains("Assemblies"));
    }

    #[test]
    fn test_reset_unknown_accession_fails() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);

        reconcile(&dir)
            .args(["reset", "CM999999"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn test_reset_returns_jobs_to_unknown() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);
        seed_finished_chromosome(&dir, "CM000001", "GCA_000001");

        reconcile(&dir)
            .args(["reset", "CM000001"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Reset 4 job(s) for CM000001"));

        let statuses = job_statuses(&dir.path().join("state/annotation.db"), "CM000001");
        assert!(statuses.iter().all(|s| *s == JobStatus::Unknown));
    }
}

// =============================================================================
// Reconciliation Pass
// =============================================================================

mod run_pass {
    use super::*;

    #[test]
    fn test_run_without_database_fails() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");

        reconcile(&dir)
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("annot-reconcile init"));
    }

    #[test]
    fn test_run_on_empty_database() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);

        reconcile(&dir)
            .arg("run")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to reconcile"));
    }

    #[test]
    fn test_run_verifies_and_consolidates() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);
        seed_finished_chromosome(&dir, "CM000001", "GCA_000001");

        reconcile(&dir)
            .arg("run")
            .assert()
            .success()
            .stdout(predicate::str::contains("Verified"))
            .stdout(predicate::str::contains("CM000001"))
            .stdout(predicate::str::contains("Consolidated: GCA_000001"));

        let statuses = job_statuses(&dir.path().join("state/annotation.db"), "CM000001");
        assert!(statuses.iter().all(|s| *s == JobStatus::Success));
        assert!(
            dir.path()
                .join("results/GCA_000001/CM000001/CM000001.wig")
                .is_file()
        );
    }

    #[test]
    fn test_run_json_report() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");
        init(&dir);
        seed_finished_chromosome(&dir, "CM000001", "GCA_000001");

        let output = reconcile(&dir).args(["run", "--json"]).output().unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["finished"], serde_json::json!(["CM000001"]));
        assert_eq!(report["verified"][0]["succeeded"], 4);
        assert_eq!(report["assemblies_completed"], serde_json::json!(["GCA_000001"]));
    }

    #[test]
    fn test_running_accession_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "1041 annot RUN normal node17 CpG_CM000001.yml Oct 19 09:12");
        init(&dir);
        seed_finished_chromosome(&dir, "CM000001", "GCA_000001");

        let output = reconcile(&dir).args(["run", "--json"]).output().unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["running"], serde_json::json!(["CM000001"]));
        assert_eq!(report["finished"], serde_json::json!([]));

        let statuses = job_statuses(&dir.path().join("state/annotation.db"), "CM000001");
        assert!(statuses.iter().all(|s| *s == JobStatus::Submitted));
    }

    #[test]
    fn test_missing_scheduler_command_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("reconcile.toml"),
            "[scheduler]\ncommand = \"definitely-not-a-scheduler\"\n",
        )
        .unwrap();
        init(&dir);

        reconcile(&dir)
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("definitely-not-a-scheduler"));
    }
}
