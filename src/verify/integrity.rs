use std::fs::File;
use std::io::Read;

use crate::errors::IntegrityError;
use crate::layout::ResultsLayout;

/// Result of comparing a stored checksum against the reference value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityOutcome {
    Match,
    Mismatch { expected: String, found: String },
}

impl IntegrityOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Compare the first `checksum_len` bytes of the unit's checksum file with
/// `reference`. No digest is computed here; the job that extracted the
/// sequence wrote the checksum file.
pub fn verify_checksum(
    layout: &ResultsLayout,
    accession: &str,
    reference: Option<&str>,
    checksum_len: usize,
) -> Result<IntegrityOutcome, IntegrityError> {
    let reference = reference.ok_or_else(|| IntegrityError::MissingReference {
        accession: accession.to_string(),
    })?;

    let path = layout.checksum_file(accession);
    let mut stored = Vec::with_capacity(checksum_len);
    File::open(&path)
        .and_then(|file| file.take(checksum_len as u64).read_to_end(&mut stored))
        .map_err(|source| IntegrityError::ChecksumUnreadable {
            path: path.clone(),
            source,
        })?;

    if stored == reference.as_bytes() {
        Ok(IntegrityOutcome::Match)
    } else {
        Ok(IntegrityOutcome::Mismatch {
            expected: reference.to_string(),
            found: String::from_utf8_lossy(&stored).into_owned(),
        })
    }
}
