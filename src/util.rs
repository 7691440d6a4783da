//! Shared utility functions for the reconciliation crate.

/// Find every top-level brace-delimited block in `text`, in order of appearance.
/// Uses brace-counting, ignoring braces inside double-quoted strings. A `{`
/// that is never closed is skipped and the scan resumes right after it, so
/// stray braces in surrounding output cannot hide a later block.
pub fn brace_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        match block_end(&text[start..]) {
            Some(len) => {
                blocks.push(&text[start..start + len]);
                pos = start + len;
            }
            None => pos = start + 1,
        }
    }

    blocks
}

/// Length of the balanced block opening at the start of `text`, or `None`
/// when the opening brace is never closed.
fn block_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// The last complete top-level brace-delimited block in `text`, if any.
pub fn last_brace_block(text: &str) -> Option<&str> {
    brace_blocks(text).pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brace_blocks_simple() {
        let text = r#"{"key": "value"}"#;
        assert_eq!(brace_blocks(text), vec![r#"{"key": "value"}"#]);
    }

    #[test]
    fn test_brace_blocks_with_surrounding_text() {
        let text = "INFO starting\n{\"a\": 1}\nINFO done";
        assert_eq!(last_brace_block(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_brace_blocks_nested_is_one_block() {
        let text = r#"{"outer": {"inner": "value"}}"#;
        assert_eq!(brace_blocks(text).len(), 1);
    }

    #[test]
    fn test_last_block_wins() {
        let text = "{\"step\": 1}\nprogress...\n{\"step\": 2}\n";
        assert_eq!(last_brace_block(text), Some("{\"step\": 2}"));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"location": "file:///tmp/{odd}}dir"}"#;
        assert_eq!(last_brace_block(text), Some(text));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"k": "a \" } b"}"#;
        assert_eq!(last_brace_block(text), Some(text));
    }

    #[test]
    fn test_no_block() {
        assert_eq!(last_brace_block("No JSON here"), None);
    }

    #[test]
    fn test_unclosed_trailing_block_is_skipped() {
        let text = "{\"done\": true}\n{\"key\": \"value\"";
        assert_eq!(last_brace_block(text), Some("{\"done\": true}"));
    }

    #[test]
    fn test_unclosed_brace_before_summary_is_skipped() {
        let summary = "{\n  \"GCout\": {\"size\": 120, \"checksum\": \"sha1$abc123\"}\n}";
        let text = format!("+ echo progress {{50%\n{summary}\n");
        assert_eq!(last_brace_block(&text), Some(summary));
    }

    #[test]
    fn test_unbalanced_quote_in_stray_brace_is_skipped() {
        let summary = "{\"GCout\": {\"size\": 1, \"checksum\": \"sha1$aa\"}}";
        let text = format!("note {{say \"hi}}\n{summary}\n");
        assert_eq!(last_brace_block(&text), Some(summary));
    }

    #[test]
    fn test_stray_closing_brace_is_ignored() {
        assert_eq!(last_brace_block("} {\"a\": 1}"), Some("{\"a\": 1}"));
    }
}
