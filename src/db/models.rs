use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four annotation computations run for every sequence unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobKind {
    #[serde(rename = "GC")]
    Gc,
    #[serde(rename = "trf")]
    Trf,
    #[serde(rename = "CpG")]
    CpG,
    #[serde(rename = "get_fasta")]
    GetFasta,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [Self::Gc, Self::Trf, Self::CpG, Self::GetFasta];

    /// Name stored in the `jobs.job_name` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gc => "GC",
            Self::Trf => "trf",
            Self::CpG => "CpG",
            Self::GetFasta => "get_fasta",
        }
    }

    /// Output key in the result summary whose record describes this job.
    pub fn summary_key(&self) -> &'static str {
        match self {
            Self::Gc => "GCout",
            Self::Trf => "TRF_bed_out",
            Self::CpG => "CpG_out",
            Self::GetFasta => "fasta_out",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GC" => Ok(Self::Gc),
            "trf" => Ok(Self::Trf),
            "CpG" => Ok(Self::CpG),
            "get_fasta" => Ok(Self::GetFasta),
            _ => Err(format!("Invalid job name: {}", s)),
        }
    }
}

/// Lifecycle of a job, sequence unit, or assembly record.
///
/// The store keeps the legacy integer encoding (NULL, 0, 1, other) so that
/// external submitters keep working; everything above the store uses this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Unknown,
    Submitted,
    Success,
    Failed,
}

impl JobStatus {
    const SUCCESS_CODE: i64 = 0;
    const SUBMITTED_CODE: i64 = 1;
    const FAILED_CODE: i64 = 2;

    pub fn from_db(code: Option<i64>) -> Self {
        match code {
            None => Self::Unknown,
            Some(Self::SUCCESS_CODE) => Self::Success,
            Some(Self::SUBMITTED_CODE) => Self::Submitted,
            Some(_) => Self::Failed,
        }
    }

    pub fn to_db(self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::Success => Some(Self::SUCCESS_CODE),
            Self::Submitted => Some(Self::SUBMITTED_CODE),
            Self::Failed => Some(Self::FAILED_CODE),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Submitted => "submitted",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a sequence unit is a chromosome of an assembly or an
/// assembly-level scaffold entry that stands in for the assembly itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Chromosome,
    Scaffold,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromosome => "chromosome",
            Self::Scaffold => "scaffold",
        }
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromosome" => Ok(Self::Chromosome),
            "scaffold" => Ok(Self::Scaffold),
            _ => Err(format!("Invalid unit kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub accession: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceUnit {
    pub accession: String,
    pub kind: UnitKind,
    pub assembly_accession: String,
    pub reference_md5: Option<String>,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub accession: String,
    pub status: JobStatus,
}

/// Verdict and digest the state updater writes to one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub content_hash: Option<String>,
}

/// Per-status record counts for the `status` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub unknown: usize,
    pub submitted: usize,
    pub success: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: JobStatus) {
        match status {
            JobStatus::Unknown => self.unknown += 1,
            JobStatus::Submitted => self.submitted += 1,
            JobStatus::Success => self.success += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unknown + self.submitted + self.success + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_roundtrips_through_column_name() {
        for kind in JobKind::ALL {
            assert_eq!(JobKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(JobKind::from_str("gc").is_err());
    }

    #[test]
    fn test_status_decodes_legacy_integers() {
        assert_eq!(JobStatus::from_db(None), JobStatus::Unknown);
        assert_eq!(JobStatus::from_db(Some(0)), JobStatus::Success);
        assert_eq!(JobStatus::from_db(Some(1)), JobStatus::Submitted);
        assert_eq!(JobStatus::from_db(Some(-1)), JobStatus::Failed);
        assert_eq!(JobStatus::from_db(Some(137)), JobStatus::Failed);
    }

    #[test]
    fn test_unknown_is_stored_as_null() {
        assert_eq!(JobStatus::Unknown.to_db(), None);
        assert_eq!(JobStatus::Success.to_db(), Some(0));
    }

    #[test]
    fn test_status_counts_total() {
        let mut counts = StatusCounts::default();
        counts.add(JobStatus::Success);
        counts.add(JobStatus::Success);
        counts.add(JobStatus::Unknown);
        assert_eq!(counts.success, 2);
        assert_eq!(counts.total(), 3);
    }
}
