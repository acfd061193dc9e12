//! Score records
//!
//! Stored and exported as `{ "name", "score", "ts", "_sessionId"? }`. Anything
//! read back from storage or an imported file is untrusted, so every field goes
//! through the coercion helpers below rather than strict deserialization.

use serde::Serialize;
use serde_json::Value;

use crate::consts::{DEFAULT_NAME, SESSION_DEFAULT_NAME};

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) when written
    #[serde(rename = "ts")]
    pub timestamp: u64,
    /// Set only on the live row mirrored from the running game
    #[serde(rename = "_sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ScoreEntry {
    /// Manually submitted entry. Blank names become "Anon".
    pub fn new(name: &str, score: u64, timestamp: u64) -> Self {
        Self {
            name: name_or(name, DEFAULT_NAME),
            score,
            timestamp,
            session_id: None,
        }
    }

    /// Live entry owned by a session. Blank names become "You".
    pub fn for_session(session_id: &str, name: &str, score: u64, timestamp: u64) -> Self {
        Self {
            name: name_or(name, SESSION_DEFAULT_NAME),
            score,
            timestamp,
            session_id: Some(session_id.to_string()),
        }
    }

    pub fn is_live(&self) -> bool {
        self.session_id.is_some()
    }

    /// Normalize a stored JSON value. Returns `None` for non-objects.
    pub fn from_value(value: &Value, fallback_ts: u64) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            name: coerce_name(obj.get("name"), DEFAULT_NAME),
            score: obj.get("score").map(coerce_score).unwrap_or(0),
            timestamp: coerce_timestamp(obj.get("ts"), fallback_ts),
            session_id: obj
                .get("_sessionId")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Accept an entry from an imported file.
    ///
    /// The value must be an object carrying a string `name` or a numeric
    /// `score` (a number or a string holding one); everything else is
    /// rejected. Session ids are not carried over, imported rows are always
    /// ordinary entries.
    pub fn from_import(value: &Value, now: u64) -> Option<Self> {
        let obj = value.as_object()?;
        let has_name = obj.get("name").is_some_and(Value::is_string);
        let has_score = obj.get("score").is_some_and(is_numeric);
        if !has_name && !has_score {
            return None;
        }

        let mut entry = Self::from_value(value, now)?;
        entry.session_id = None;
        Some(entry)
    }
}

fn name_or(name: &str, default: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Non-empty strings are kept verbatim, anything else takes the default.
pub fn coerce_name(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Coerce an arbitrary JSON value to a score.
///
/// Numbers truncate toward zero, numeric strings are parsed, booleans count
/// as 0/1. Negative, non-finite and non-numeric input all yield 0.
pub fn coerce_score(value: &Value) -> u64 {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => v,
            None => n.as_f64().map(coerce_f64).unwrap_or(0),
        },
        Value::String(s) => coerce_score_str(s),
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}

/// Coerce free text (a form field, a CLI argument) to a score.
pub fn coerce_score_str(s: &str) -> u64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.parse::<f64>().map(coerce_f64).unwrap_or(0)
}

/// Coerce a float to a score. NaN, infinities and negatives yield 0.
pub fn coerce_f64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.trunc() as u64
    } else {
        0
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn coerce_timestamp(value: Option<&Value>, fallback: u64) -> u64 {
    match value.and_then(Value::as_f64).map(coerce_f64) {
        Some(ts) if ts > 0 => ts,
        _ => fallback,
    }
}
