//! SQLite-backed record of expected annotation work.
//!
//! `AnnotationDb` is the session object for one reconciliation pass. It owns a
//! single connection, is passed by reference into every component, and closes
//! the connection when dropped.

pub mod models;

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use models::*;

pub struct AnnotationDb {
    conn: Connection,
}

impl AnnotationDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS assemblies (
                    accession TEXT PRIMARY KEY,
                    status INTEGER
                );

                CREATE TABLE IF NOT EXISTS sequence_units (
                    accession TEXT PRIMARY KEY,
                    kind TEXT NOT NULL CHECK (kind IN ('chromosome', 'scaffold')),
                    assembly_accession TEXT NOT NULL REFERENCES assemblies(accession),
                    reference_md5 TEXT,
                    status INTEGER
                );

                CREATE TABLE IF NOT EXISTS jobs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    accession TEXT NOT NULL REFERENCES sequence_units(accession),
                    job_name TEXT NOT NULL CHECK (job_name IN ('GC', 'trf', 'CpG', 'get_fasta')),
                    status INTEGER,
                    content_hash TEXT,
                    UNIQUE(accession, job_name)
                );

                CREATE INDEX IF NOT EXISTS idx_units_assembly ON sequence_units(assembly_accession);
                CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Registration ──────────────────────────────────────────────────

    pub fn add_assembly(&self, accession: &str) -> Result<Assembly> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO assemblies (accession) VALUES (?1)",
                params![accession],
            )
            .context("Failed to insert assembly")?;
        self.assembly(accession)?
            .context("Assembly not found after insert")
    }

    pub fn add_sequence_unit(
        &self,
        accession: &str,
        kind: UnitKind,
        assembly_accession: &str,
        reference_md5: Option<&str>,
    ) -> Result<SequenceUnit> {
        self.conn
            .execute(
                "INSERT INTO sequence_units (accession, kind, assembly_accession, reference_md5)
                 VALUES (?1, ?2, ?3, ?4)",
                params![accession, kind.as_str(), assembly_accession, reference_md5],
            )
            .with_context(|| format!("Failed to insert sequence unit {}", accession))?;
        self.sequence_unit(accession)?
            .context("Sequence unit not found after insert")
    }

    pub fn add_job(&self, accession: &str, kind: JobKind) -> Result<Job> {
        self.conn
            .execute(
                "INSERT INTO jobs (accession, job_name) VALUES (?1, ?2)",
                params![accession, kind.as_str()],
            )
            .with_context(|| format!("Failed to insert {} job for {}", kind, accession))?;
        let id = self.conn.last_insert_rowid();
        Ok(Job {
            id,
            accession: accession.to_string(),
            kind,
            status: JobStatus::Unknown,
            content_hash: None,
        })
    }

    /// Record that every job of `accession` has been handed to the scheduler.
    pub fn mark_submitted(&self, accession: &str) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE jobs SET status = ?1 WHERE accession = ?2",
                params![JobStatus::Submitted.to_db(), accession],
            )
            .context("Failed to mark jobs submitted")
    }

    pub fn set_job_status(&self, accession: &str, kind: JobKind, status: JobStatus) -> Result<()> {
        self.conn
            .execute(
                "UPDATE jobs SET status = ?1 WHERE accession = ?2 AND job_name = ?3",
                params![status.to_db(), accession, kind.as_str()],
            )
            .context("Failed to update job status")?;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Accessions with at least one job still carrying the submitted marker.
    pub fn submitted_accessions(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT accession FROM jobs WHERE status = ?1 ORDER BY accession")
            .context("Failed to prepare submitted_accessions")?;
        let rows = stmt
            .query_map(params![JobStatus::Submitted.to_db()], |row| row.get(0))
            .context("Failed to query submitted jobs")?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .context("Failed to read submitted accession row")
    }

    pub fn jobs_for(&self, accession: &str) -> Result<Vec<Job>> {
        self.query_jobs(
            "SELECT id, accession, job_name, status, content_hash FROM jobs
             WHERE accession = ?1 ORDER BY id",
            params![accession],
        )
    }

    pub fn all_jobs(&self) -> Result<Vec<Job>> {
        self.query_jobs(
            "SELECT id, accession, job_name, status, content_hash FROM jobs ORDER BY accession, id",
            [],
        )
    }

    fn query_jobs(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Job>> {
        let mut stmt = self.conn.prepare(sql).context("Failed to prepare job query")?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(JobRow {
                    id: row.get(0)?,
                    accession: row.get(1)?,
                    job_name: row.get(2)?,
                    status: row.get(3)?,
                    content_hash: row.get(4)?,
                })
            })
            .context("Failed to query jobs")?;
        let mut jobs = Vec::new();
        for row in rows {
            let r = row.context("Failed to read job row")?;
            jobs.push(r.into_job()?);
        }
        Ok(jobs)
    }

    pub fn sequence_unit(&self, accession: &str) -> Result<Option<SequenceUnit>> {
        let mut units = self.query_units(
            "SELECT accession, kind, assembly_accession, reference_md5, status
             FROM sequence_units WHERE accession = ?1",
            params![accession],
        )?;
        Ok(units.pop())
    }

    pub fn sequence_units(&self) -> Result<Vec<SequenceUnit>> {
        self.query_units(
            "SELECT accession, kind, assembly_accession, reference_md5, status
             FROM sequence_units ORDER BY accession",
            [],
        )
    }

    /// Sequence units belonging to one assembly.
    pub fn members_of(&self, assembly_accession: &str) -> Result<Vec<SequenceUnit>> {
        self.query_units(
            "SELECT accession, kind, assembly_accession, reference_md5, status
             FROM sequence_units WHERE assembly_accession = ?1 ORDER BY accession",
            params![assembly_accession],
        )
    }

    fn query_units(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SequenceUnit>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .context("Failed to prepare sequence unit query")?;
        let rows = stmt
            .query_map(params, |row| {
                Ok(UnitRow {
                    accession: row.get(0)?,
                    kind: row.get(1)?,
                    assembly_accession: row.get(2)?,
                    reference_md5: row.get(3)?,
                    status: row.get(4)?,
                })
            })
            .context("Failed to query sequence units")?;
        let mut units = Vec::new();
        for row in rows {
            let r = row.context("Failed to read sequence unit row")?;
            units.push(r.into_unit()?);
        }
        Ok(units)
    }

    pub fn assembly(&self, accession: &str) -> Result<Option<Assembly>> {
        let mut stmt = self
            .conn
            .prepare("SELECT accession, status FROM assemblies WHERE accession = ?1")
            .context("Failed to prepare get_assembly")?;
        let mut rows = stmt
            .query_map(params![accession], |row| {
                Ok(Assembly {
                    accession: row.get(0)?,
                    status: JobStatus::from_db(row.get(1)?),
                })
            })
            .context("Failed to query assembly")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read assembly row")?)),
            None => Ok(None),
        }
    }

    pub fn assemblies(&self) -> Result<Vec<Assembly>> {
        let mut stmt = self
            .conn
            .prepare("SELECT accession, status FROM assemblies ORDER BY accession")
            .context("Failed to prepare list_assemblies")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Assembly {
                    accession: row.get(0)?,
                    status: JobStatus::from_db(row.get(1)?),
                })
            })
            .context("Failed to query assemblies")?;
        rows.collect::<rusqlite::Result<Vec<Assembly>>>()
            .context("Failed to read assembly row")
    }

    /// Per-status counts of jobs, sequence units, and assemblies.
    pub fn status_counts(&self) -> Result<(StatusCounts, StatusCounts, StatusCounts)> {
        let mut jobs = StatusCounts::default();
        for job in self.all_jobs()? {
            jobs.add(job.status);
        }
        let mut units = StatusCounts::default();
        for unit in self.sequence_units()? {
            units.add(unit.status);
        }
        let mut assemblies = StatusCounts::default();
        for assembly in self.assemblies()? {
            assemblies.add(assembly.status);
        }
        Ok((jobs, units, assemblies))
    }

    // ── State transitions ─────────────────────────────────────────────

    /// Write verdicts and digests to every job of `accession` in one transaction.
    /// Jobs whose kind has no entry in `updates` become Unknown with no digest.
    /// Returns the number of jobs now marked Success.
    pub fn apply_job_updates(
        &self,
        accession: &str,
        updates: &HashMap<JobKind, JobUpdate>,
    ) -> Result<usize> {
        let jobs = self.jobs_for(accession)?;

        // Use unchecked_transaction so the whole unit commits or none of it does.
        // The session is never shared across threads.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let mut succeeded = 0;
        for job in &jobs {
            let (status, hash) = match updates.get(&job.kind) {
                Some(update) => (update.status, update.content_hash.as_deref()),
                None => (JobStatus::Unknown, None),
            };
            tx.execute(
                "UPDATE jobs SET status = ?1, content_hash = ?2 WHERE id = ?3",
                params![status.to_db(), hash, job.id],
            )
            .with_context(|| format!("Failed to update {} job for {}", job.kind, accession))?;
            if status.is_success() {
                succeeded += 1;
            }
        }
        tx.commit().context("Failed to commit job updates")?;
        Ok(succeeded)
    }

    /// Return every job of `accession` to Unknown in one transaction.
    pub fn reset_jobs(&self, accession: &str) -> Result<usize> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let count = tx
            .execute(
                "UPDATE jobs SET status = NULL WHERE accession = ?1",
                params![accession],
            )
            .context("Failed to reset jobs")?;
        tx.commit().context("Failed to commit reset")?;
        Ok(count)
    }

    /// Set the status of many sequence units and assemblies in one transaction.
    pub fn set_rollup_statuses(
        &self,
        units: &[String],
        assemblies: &[String],
        status: JobStatus,
    ) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        for accession in units {
            tx.execute(
                "UPDATE sequence_units SET status = ?1 WHERE accession = ?2",
                params![status.to_db(), accession],
            )
            .with_context(|| format!("Failed to update sequence unit {}", accession))?;
        }
        for accession in assemblies {
            tx.execute(
                "UPDATE assemblies SET status = ?1 WHERE accession = ?2",
                params![status.to_db(), accession],
            )
            .with_context(|| format!("Failed to update assembly {}", accession))?;
        }
        tx.commit().context("Failed to commit rollup")?;
        Ok(())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────

struct JobRow {
    id: i64,
    accession: String,
    job_name: String,
    status: Option<i64>,
    content_hash: Option<String>,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let kind = JobKind::from_str(&self.job_name).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Job {
            id: self.id,
            accession: self.accession,
            kind,
            status: JobStatus::from_db(self.status),
            content_hash: self.content_hash,
        })
    }
}

struct UnitRow {
    accession: String,
    kind: String,
    assembly_accession: String,
    reference_md5: Option<String>,
    status: Option<i64>,
}

impl UnitRow {
    fn into_unit(self) -> Result<SequenceUnit> {
        let kind = UnitKind::from_str(&self.kind).map_err(|e| anyhow::anyhow!(e))?;
        Ok(SequenceUnit {
            accession: self.accession,
            kind,
            assembly_accession: self.assembly_accession,
            reference_md5: self.reference_md5,
            status: JobStatus::from_db(self.status),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
