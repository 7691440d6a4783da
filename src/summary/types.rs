//! Result-summary types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::models::JobKind;

/// One output artifact as reported by the job that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRecord {
    /// Size in bytes
    pub size: u64,
    /// Tagged digest, e.g. `sha1$0a4d55a8...`
    pub checksum: String,
    /// Digest with the algorithm tag removed
    pub digest: String,
}

impl ArtifactRecord {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Parsed result summary, keyed by output name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub outputs: BTreeMap<String, ArtifactRecord>,
}

impl ResultSummary {
    pub fn get(&self, key: &str) -> Option<&ArtifactRecord> {
        self.outputs.get(key)
    }

    /// The record describing the primary output of a job kind.
    pub fn for_job(&self, kind: JobKind) -> Option<&ArtifactRecord> {
        self.get(kind.summary_key())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
