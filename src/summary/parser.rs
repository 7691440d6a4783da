//! Strict parser for result-summary blocks.
//!
//! Every record is validated field by field; anything that does not match the
//! expected shape is rejected with a typed `SummaryError` rather than coerced.

use serde_json::{Map, Value};
use tracing::debug;

use super::types::{ArtifactRecord, ResultSummary};
use crate::errors::SummaryError;
use crate::util::last_brace_block;

/// Parser for the summary block a job prints to its captured output.
#[derive(Debug, Clone)]
pub struct SummaryParser {
    /// Length of the digest-algorithm tag at the front of each checksum
    tag_len: usize,
}

impl SummaryParser {
    pub fn new(tag_len: usize) -> Self {
        Self { tag_len }
    }

    /// Locate the last brace-delimited block in `text` and parse it.
    ///
    /// Returns `Ok(None)` when the text has no block at all, which callers
    /// treat as abnormal termination of the job.
    pub fn parse(&self, text: &str) -> Result<Option<ResultSummary>, SummaryError> {
        match last_brace_block(text) {
            Some(block) => self.parse_block(block).map(Some),
            None => Ok(None),
        }
    }

    /// Parse one brace-delimited block.
    pub fn parse_block(&self, block: &str) -> Result<ResultSummary, SummaryError> {
        let value: Value = serde_json::from_str(block).map_err(SummaryError::InvalidJson)?;
        let Value::Object(entries) = value else {
            return Err(SummaryError::NotAnObject);
        };

        let mut summary = ResultSummary::default();
        for (key, entry) in entries {
            match entry {
                Value::Null => {
                    debug!(output = %key, "summary output is null, treating as not produced");
                }
                Value::Object(fields) => {
                    let record = self.parse_record(&key, &fields)?;
                    summary.outputs.insert(key, record);
                }
                _ => return Err(SummaryError::RecordNotObject { key }),
            }
        }
        Ok(summary)
    }

    fn parse_record(
        &self,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<ArtifactRecord, SummaryError> {
        let size = match fields.get("size") {
            None => {
                return Err(SummaryError::MissingField {
                    key: key.to_string(),
                    field: "size",
                });
            }
            Some(v) => v.as_u64().ok_or_else(|| SummaryError::WrongType {
                key: key.to_string(),
                field: "size",
                expected: "a non-negative integer",
            })?,
        };

        let checksum = match fields.get("checksum") {
            None => {
                return Err(SummaryError::MissingField {
                    key: key.to_string(),
                    field: "checksum",
                });
            }
            Some(v) => v.as_str().ok_or_else(|| SummaryError::WrongType {
                key: key.to_string(),
                field: "checksum",
                expected: "a string",
            })?,
        };

        let digest = checksum
            .get(self.tag_len..)
            .ok_or_else(|| SummaryError::ChecksumTooShort {
                key: key.to_string(),
                checksum: checksum.to_string(),
                tag_len: self.tag_len,
            })?;

        Ok(ArtifactRecord {
            size,
            checksum: checksum.to_string(),
            digest: digest.to_string(),
        })
    }
}

/// Convenience function using the standard 5-character tag (`sha1$`).
pub fn parse_summary(text: &str) -> Result<Option<ResultSummary>, SummaryError> {
    SummaryParser::new(crate::config::DEFAULT_CHECKSUM_TAG_LEN).parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::JobKind;

    #[test]
    fn test_parse_gc_record_strips_tag() {
        let summary = parse_summary(r#"{"GCout": {"size": 120, "checksum": "sha1:abc123"}}"#)
            .unwrap()
            .expect("block should be found");
        let gc = summary.for_job(JobKind::Gc).unwrap();
        assert_eq!(gc.size, 120);
        assert_eq!(gc.checksum, "sha1:abc123");
        assert_eq!(gc.digest, "abc123");
    }

    #[test]
    fn test_parse_returns_none_without_block() {
        assert_eq!(parse_summary("Job was killed: TERM_RUNLIMIT").unwrap(), None);
    }

    #[test]
    fn test_last_block_is_authoritative() {
        let log = r#"
            {"GCout": {"size": 0, "checksum": "sha1$0000"}}
            INFO [workflow] completed success
            {
                "GCout": {"size": 55, "checksum": "sha1$ffff", "location": "file:///r/CM1/CM1.wig"},
                "CpG_out": {"size": 10, "checksum": "sha1$eeee"}
            }
        "#;
        let summary = parse_summary(log).unwrap().unwrap();
        assert_eq!(summary.len(), 2);
        let gc = summary.get("GCout").unwrap();
        assert_eq!(gc.size, 55);
        assert_eq!(gc.digest, "ffff");
    }

    #[test]
    fn test_null_output_is_absent() {
        let summary = parse_summary(r#"{"GCout": null, "CpG_out": {"size": 1, "checksum": "sha1$aa"}}"#)
            .unwrap()
            .unwrap();
        assert!(summary.get("GCout").is_none());
        assert!(summary.for_job(JobKind::CpG).is_some());
    }

    #[test]
    fn test_rejects_invalid_json() {
        let err = parse_summary("{GCout: size=1}").unwrap_err();
        assert!(matches!(err, SummaryError::InvalidJson(_)));
    }

    #[test]
    fn test_rejects_non_record_entry() {
        let err = parse_summary(r#"{"GCout": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, SummaryError::RecordNotObject { ref key } if key == "GCout"));
    }

    #[test]
    fn test_rejects_missing_size() {
        let err = parse_summary(r#"{"GCout": {"checksum": "sha1$aa"}}"#).unwrap_err();
        assert!(matches!(
            err,
            SummaryError::MissingField { field: "size", .. }
        ));
    }

    #[test]
    fn test_rejects_negative_size() {
        let err = parse_summary(r#"{"GCout": {"size": -4, "checksum": "sha1$aa"}}"#).unwrap_err();
        assert!(matches!(err, SummaryError::WrongType { field: "size", .. }));
    }

    #[test]
    fn test_rejects_string_size() {
        let err = parse_summary(r#"{"GCout": {"size": "12", "checksum": "sha1$aa"}}"#).unwrap_err();
        assert!(matches!(err, SummaryError::WrongType { field: "size", .. }));
    }

    #[test]
    fn test_rejects_non_string_checksum() {
        let err = parse_summary(r#"{"GCout": {"size": 1, "checksum": 42}}"#).unwrap_err();
        assert!(matches!(
            err,
            SummaryError::WrongType {
                field: "checksum",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_checksum_shorter_than_tag() {
        let err = parse_summary(r#"{"GCout": {"size": 1, "checksum": "sha"}}"#).unwrap_err();
        assert!(matches!(err, SummaryError::ChecksumTooShort { tag_len: 5, .. }));
    }

    #[test]
    fn test_custom_tag_length() {
        let parser = SummaryParser::new(7);
        let summary = parser
            .parse(r#"{"fasta_out": {"size": 9, "checksum": "sha256$beef"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(summary.for_job(JobKind::GetFasta).unwrap().digest, "beef");
    }

    #[test]
    fn test_top_level_must_be_object() {
        let parser = SummaryParser::new(5);
        assert!(matches!(
            parser.parse_block("[1]"),
            Err(SummaryError::NotAnObject)
        ));
    }
}
