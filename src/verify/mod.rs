//! Per-unit checks that run before any job state is written.
//!
//! - `artifacts` decides, per job kind, whether the expected output files exist
//!   and the summary reports them as non-empty.
//! - `integrity` compares a chromosome's stored checksum file against the
//!   reference checksum in the record of expected work.

mod artifacts;
mod integrity;

pub use artifacts::{IndeterminateReason, Verdict, inspect_artifacts};
pub use integrity::{IntegrityOutcome, verify_checksum};
