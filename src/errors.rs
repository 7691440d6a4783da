//! Typed error hierarchy for the reconciliation engine.
//!
//! Three enums cover the three places where callers need to tell failures apart:
//! - `SummaryError`: malformed result-summary blocks in a job's captured log
//! - `IntegrityError`: the chromosome checksum step could not run
//! - `ReconcileError`: pass-level failures (scheduler, store, consolidation)

use std::path::PathBuf;

use thiserror::Error;

/// Errors from parsing a job's result-summary block.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Result summary is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Result summary must be an object keyed by output name")]
    NotAnObject,

    #[error("Output '{key}' is not a record")]
    RecordNotObject { key: String },

    #[error("Output '{key}' is missing field '{field}'")]
    MissingField { key: String, field: &'static str },

    #[error("Output '{key}' field '{field}' must be {expected}")]
    WrongType {
        key: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Output '{key}' checksum '{checksum}' is shorter than its {tag_len}-character tag")]
    ChecksumTooShort {
        key: String,
        checksum: String,
        tag_len: usize,
    },
}

/// Errors that prevent a chromosome's checksum from being compared at all.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("Failed to read checksum file at {path}: {source}")]
    ChecksumUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No reference checksum recorded for {accession}")]
    MissingReference { accession: String },
}

/// Errors that abort a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to run scheduler command '{command}': {source}")]
    SchedulerSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scheduler command '{command}' exited with code {code:?}: {stderr}")]
    SchedulerFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Sequence unit {accession} not found")]
    UnknownUnit { accession: String },

    #[error("Failed to copy {member} into assembly {assembly} at {path}: {source}")]
    ConsolidationFailed {
        assembly: String,
        member: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
