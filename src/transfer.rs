//! Leaderboard files
//!
//! Exports are the stored collection, pretty-printed. Imports are lenient:
//! junk rows are dropped, survivors are coerced, and the batch is appended to
//! what is already stored.

use serde_json::Value;

use crate::entry::ScoreEntry;
use crate::error::ImportError;

/// A file ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

impl ExportFile {
    pub const MIME_TYPE: &'static str = "application/json";
}

/// Outcome of a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Rows appended to the leaderboard
    pub accepted: usize,
    /// Rows discarded as malformed
    pub dropped: usize,
}

/// Serialize entries the way export files look
pub fn export_json(entries: &[ScoreEntry]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(entries)
}

/// Parse and clean an import file.
///
/// Fails only when the text is not JSON or not an array. Returns the accepted
/// entries and the number of dropped rows.
pub fn parse_import(text: &str, now: u64) -> Result<(Vec<ScoreEntry>, usize), ImportError> {
    let parsed: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    let Value::Array(items) = parsed else {
        return Err(ImportError::InvalidFormat);
    };

    let entries: Vec<ScoreEntry> = items
        .iter()
        .filter_map(|item| ScoreEntry::from_import(item, now))
        .collect();
    let dropped = items.len() - entries.len();
    Ok((entries, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_is_pretty() {
        let json = export_json(&[ScoreEntry::new("Nemo", 3, 9)]).unwrap();
        assert_eq!(
            json,
            "[\n  {\n    \"name\": \"Nemo\",\n    \"score\": 3,\n    \"ts\": 9\n  }\n]"
        );
    }

    #[test]
    fn test_parse_import_mixed_rows() {
        let (entries, dropped) =
            parse_import(r#"[null, {"foo":1}, {"name":"X"}, {"score":"7"}]"#, 500).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(
            entries,
            vec![ScoreEntry::new("X", 0, 500), ScoreEntry::new("Anon", 7, 500)]
        );
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        assert!(matches!(
            parse_import(r#"{"name": "X"}"#, 0),
            Err(ImportError::InvalidFormat)
        ));
        assert!(matches!(parse_import("42", 0), Err(ImportError::InvalidFormat)));
        assert!(matches!(parse_import("not json", 0), Err(ImportError::Parse(_))));
        assert!(matches!(parse_import("", 0), Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_parse_import_empty_array() {
        let (entries, dropped) = parse_import("[]", 0).unwrap();
        assert!(entries.is_empty());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ImportError::InvalidFormat.to_string(), "Invalid format");
        let err = parse_import("{", 0).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
