//! Cluster scheduler queries.
//!
//! The reconciliation pass only needs one thing from the scheduler: which
//! accessions still have a job running. Job names embed the accession between
//! a fixed prefix and suffix (`CpG_CM000001.1.yml`).

use std::collections::HashSet;
use std::process::Command;

use regex::Regex;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::errors::ReconcileError;

/// Source of the set of accessions whose jobs have not yet terminated.
pub trait Scheduler {
    fn running_accessions(&self) -> Result<HashSet<String>, ReconcileError>;
}

/// Extracts accessions from scheduler job names.
#[derive(Debug, Clone)]
pub struct JobNamePattern {
    prefix: String,
    suffix: String,
    regex: Regex,
}

impl JobNamePattern {
    pub fn new(prefix: &str, suffix: &str) -> Result<Self, ReconcileError> {
        let regex = Regex::new(&format!(
            r"(?m)({}\S*?{})(?:\s|$)",
            regex::escape(prefix),
            regex::escape(suffix)
        ))
        .map_err(|e| anyhow::anyhow!("Invalid job name pattern: {}", e))?;
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            regex,
        })
    }

    /// The accession inside a single job name, if it follows the convention.
    pub fn accession<'a>(&self, job_name: &'a str) -> Option<&'a str> {
        job_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|acc| !acc.is_empty())
    }

    /// Every accession named anywhere in a scheduler listing.
    pub fn scan(&self, listing: &str) -> HashSet<String> {
        self.regex
            .captures_iter(listing)
            .filter_map(|cap| cap.get(1))
            .filter_map(|name| self.accession(name.as_str()))
            .map(str::to_string)
            .collect()
    }
}

/// LSF scheduler queried through `bjobs -w`.
#[derive(Debug, Clone)]
pub struct LsfScheduler {
    command: String,
    args: Vec<String>,
    pattern: JobNamePattern,
}

impl LsfScheduler {
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, ReconcileError> {
        Ok(Self {
            command: config.command.clone(),
            args: config.args.clone(),
            pattern: JobNamePattern::new(&config.job_name_prefix, &config.job_name_suffix)?,
        })
    }

    fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Scheduler for LsfScheduler {
    fn running_accessions(&self) -> Result<HashSet<String>, ReconcileError> {
        let output = Command::new(&self.command)
            .args(&self.args)
            .output()
            .map_err(|source| ReconcileError::SchedulerSpawn {
                command: self.command_line(),
                source,
            })?;

        if !output.status.success() {
            return Err(ReconcileError::SchedulerFailed {
                command: self.command_line(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // "No unfinished job found" goes to stderr with an empty listing.
        let listing = String::from_utf8_lossy(&output.stdout);
        let running = self.pattern.scan(&listing);
        debug!(count = running.len(), "scheduler reports running accessions");
        Ok(running)
    }
}
