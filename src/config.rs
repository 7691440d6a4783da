//! Configuration for a reconciliation pass.
//!
//! Read from `reconcile.toml` (or the file given with `--config`), then
//! overridden by command-line flags. Every field has a default, so a partial
//! file is valid.
//!
//! # Configuration File Format
//!
//! ```toml
//! [storage]
//! results_dir = "/data/results"
//! database = "/data/annotation.db"
//!
//! [scheduler]
//! command = "bjobs"
//! args = ["-w"]
//! job_name_prefix = "CpG_"
//! job_name_suffix = ".yml"
//!
//! [summary]
//! stdout_file = "stdout.txt"
//! checksum_tag_len = 5
//! checksum_len = 32
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "reconcile.toml";

/// Length of the digest-algorithm tag (`sha1$`) in front of reported checksums.
pub const DEFAULT_CHECKSUM_TAG_LEN: usize = 5;

/// Width of the hex digest stored in a chromosome's checksum file.
pub const DEFAULT_CHECKSUM_LEN: usize = 32;

/// Where results and the record of expected work live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root holding one subdirectory per accession
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_database() -> PathBuf {
    PathBuf::from("annotation.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            database: default_database(),
        }
    }
}

/// How to ask the cluster scheduler which units are still running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_command")]
    pub command: String,
    #[serde(default = "default_scheduler_args")]
    pub args: Vec<String>,
    /// Job names look like `<prefix><accession><suffix>`
    #[serde(default = "default_job_name_prefix")]
    pub job_name_prefix: String,
    #[serde(default = "default_job_name_suffix")]
    pub job_name_suffix: String,
}

fn default_scheduler_command() -> String {
    "bjobs".to_string()
}

fn default_scheduler_args() -> Vec<String> {
    vec!["-w".to_string()]
}

fn default_job_name_prefix() -> String {
    "CpG_".to_string()
}

fn default_job_name_suffix() -> String {
    ".yml".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command: default_scheduler_command(),
            args: default_scheduler_args(),
            job_name_prefix: default_job_name_prefix(),
            job_name_suffix: default_job_name_suffix(),
        }
    }
}

/// Shape of the per-unit job output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Captured standard output inside each accession directory
    #[serde(default = "default_stdout_file")]
    pub stdout_file: String,
    #[serde(default = "default_checksum_tag_len")]
    pub checksum_tag_len: usize,
    #[serde(default = "default_checksum_len")]
    pub checksum_len: usize,
}

fn default_stdout_file() -> String {
    "stdout.txt".to_string()
}

fn default_checksum_tag_len() -> usize {
    DEFAULT_CHECKSUM_TAG_LEN
}

fn default_checksum_len() -> usize {
    DEFAULT_CHECKSUM_LEN
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            stdout_file: default_stdout_file(),
            checksum_tag_len: default_checksum_tag_len(),
            checksum_len: default_checksum_len(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

impl ReconcileConfig {
    /// Parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicitly requested file, or fall back to `reconcile.toml` in
    /// `dir` when present and to defaults otherwise.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(
        mut self,
        results_dir: Option<PathBuf>,
        database: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = results_dir {
            self.storage.results_dir = dir;
        }
        if let Some(db) = database {
            self.storage.database = db;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.command.trim().is_empty() {
            anyhow::bail!("scheduler.command must not be empty");
        }
        if self.scheduler.job_name_prefix.is_empty() && self.scheduler.job_name_suffix.is_empty() {
            anyhow::bail!("scheduler.job_name_prefix and job_name_suffix cannot both be empty");
        }
        if self.summary.checksum_len == 0 {
            anyhow::bail!("summary.checksum_len must be greater than 0");
        }
        if self.summary.stdout_file.is_empty() {
            anyhow::bail!("summary.stdout_file must not be empty");
        }
        Ok(())
    }
}
