//! Result-summary parsing for finished annotation jobs.
//!
//! A job run prints one or more brace-delimited JSON blocks to its captured
//! standard output. The last block is the authoritative summary: a flat object
//! from output name to a record with at least `size` and `checksum`. Other
//! fields, such as `location`, are ignored:
//!
//! ```text
//! {
//!     "GCout": {"location": "file:///results/CM000001/CM000001.wig", "size": 120, "checksum": "sha1$abc123"},
//!     "fasta_out": {"size": 4096, "checksum": "sha1$def456"}
//! }
//! ```
//!
//! Earlier blocks are intermediate progress output and are ignored.

mod parser;
mod types;

pub use parser::{SummaryParser, parse_summary};
pub use types::{ArtifactRecord, ResultSummary};
