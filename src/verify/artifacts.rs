use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::db::models::JobKind;
use crate::layout::ResultsLayout;
use crate::summary::ResultSummary;

/// Outcome of inspecting one job's artifacts.
///
/// There is no failure verdict at this stage: a job whose outputs are not
/// there is treated as not having run, and is left for re-submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Indeterminate(IndeterminateReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndeterminateReason {
    /// The summary has no record for the job's output
    NotReported,
    /// The summary reports a zero-byte output
    EmptyOutput,
    /// An expected file is not on disk
    MissingFile(PathBuf),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Indeterminate(IndeterminateReason::NotReported) => {
                write!(f, "indeterminate (not in result summary)")
            }
            Self::Indeterminate(IndeterminateReason::EmptyOutput) => {
                write!(f, "indeterminate (reported size is 0)")
            }
            Self::Indeterminate(IndeterminateReason::MissingFile(path)) => {
                write!(f, "indeterminate (missing {})", path.display())
            }
        }
    }
}

/// Inspect every job kind of `accession`. Reads only file metadata.
pub fn inspect_artifacts(
    layout: &ResultsLayout,
    accession: &str,
    summary: &ResultSummary,
) -> BTreeMap<JobKind, Verdict> {
    JobKind::ALL
        .into_iter()
        .map(|kind| (kind, inspect_job(layout, accession, kind, summary)))
        .collect()
}

fn inspect_job(
    layout: &ResultsLayout,
    accession: &str,
    kind: JobKind,
    summary: &ResultSummary,
) -> Verdict {
    let Some(record) = summary.for_job(kind) else {
        return Verdict::Indeterminate(IndeterminateReason::NotReported);
    };
    if let Some(missing) = layout
        .expected_artifacts(accession, kind)
        .into_iter()
        .find(|path| !path.is_file())
    {
        return Verdict::Indeterminate(IndeterminateReason::MissingFile(missing));
    }
    if record.is_empty() {
        return Verdict::Indeterminate(IndeterminateReason::EmptyOutput);
    }
    Verdict::Success
}
