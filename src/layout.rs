//! Results-root directory conventions.
//!
//! Every sequence unit writes into `<results_dir>/<accession>/`, with file
//! names built from the accession and a fixed, job-specific suffix. A
//! consolidated assembly lives in `<results_dir>/<assembly>/<member>/`.

use std::path::PathBuf;

use crate::db::models::JobKind;

/// Tandem-repeat finder parameters, encoded into its output file names
/// (match, mismatch, indel, match probability, indel probability, min score,
/// max period).
const TRF_PARAMS: &str = "2.5.7.80.10.40.500";

const TRF_EXTENSIONS: [&str; 3] = ["bed", "mask", "dat"];

#[derive(Debug, Clone)]
pub struct ResultsLayout {
    root: PathBuf,
    stdout_file: String,
}

impl ResultsLayout {
    pub fn new(root: impl Into<PathBuf>, stdout_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            stdout_file: stdout_file.into(),
        }
    }

    pub fn unit_dir(&self, accession: &str) -> PathBuf {
        self.root.join(accession)
    }

    pub fn assembly_dir(&self, assembly: &str) -> PathBuf {
        self.root.join(assembly)
    }

    /// Captured standard output of the unit's job run.
    pub fn stdout_log(&self, accession: &str) -> PathBuf {
        self.unit_dir(accession).join(&self.stdout_file)
    }

    /// Fixed-width checksum of the unit's extracted sequence.
    pub fn checksum_file(&self, accession: &str) -> PathBuf {
        self.unit_dir(accession).join(format!("{accession}.md5"))
    }

    /// Files a job of `kind` must leave behind for `accession`.
    pub fn expected_artifacts(&self, accession: &str, kind: JobKind) -> Vec<PathBuf> {
        let dir = self.unit_dir(accession);
        match kind {
            JobKind::Trf => TRF_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{accession}.fasta.{TRF_PARAMS}.{ext}")))
                .collect(),
            JobKind::Gc => vec![dir.join(format!("{accession}.wig"))],
            JobKind::CpG => vec![dir.join(format!("{accession}.CpG.txt"))],
            JobKind::GetFasta => vec![dir.join(format!("{accession}.fasta"))],
        }
    }
}
