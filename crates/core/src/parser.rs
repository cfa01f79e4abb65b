//! Extraction of structured results from free-text model completions.
//!
//! The model is asked to wrap a JSON object between two [`SENTINEL`]
//! markers. Parsing is fail-closed: anything that does not match the
//! expected shape exactly is a [`ParseError`], never a partial result.

use serde_json::{Map, Value};

use crate::analysis::{
    AnalysisKind, AnalysisResult, SensitivityVerdict, SENTINEL, UNSAFE_SHORTCUT,
};

/// Why a completion could not be turned into a typed result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("response does not contain an @@@-delimited block")]
    MissingBlock,

    #[error("delimited block is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("delimited block is not a JSON object")]
    NotAnObject,

    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("field '{0}' has an unexpected type")]
    InvalidField(&'static str),
}

/// Return the interior of the first `SENTINEL ... SENTINEL` pair.
///
/// The search is non-greedy: the closing marker is the first one after the
/// opening marker.
pub fn extract_block(raw: &str) -> Result<&str, ParseError> {
    let start = raw.find(SENTINEL).ok_or(ParseError::MissingBlock)? + SENTINEL.len();
    let len = raw[start..].find(SENTINEL).ok_or(ParseError::MissingBlock)?;
    Ok(&raw[start..start + len])
}

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````).
fn strip_code_fence(block: &str) -> &str {
    let mut inner = block.trim();
    if let Some(rest) = inner.strip_prefix("```") {
        // Drop the optional language tag on the opening fence line.
        inner = match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(char::is_alphanumeric) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches("json"),
        };
    }
    inner.trim().trim_end_matches("```").trim()
}

/// Locate the delimited block and parse it as a JSON object.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let block = strip_code_fence(extract_block(raw)?);
    let value: Value =
        serde_json::from_str(block).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject),
    }
}

fn required_text(map: &Map<String, Value>, field: &'static str) -> Result<String, ParseError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(ParseError::MissingField(field)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ParseError::MissingField(field))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(ParseError::InvalidField(field)),
    }
}

fn required_string_list(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ParseError> {
    let items = match map.get(field) {
        None | Some(Value::Null) => return Err(ParseError::MissingField(field)),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ParseError::InvalidField(field)),
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let s = item.as_str().ok_or(ParseError::InvalidField(field))?.trim();
        if !s.is_empty() && !out.iter().any(|existing: &String| existing == s) {
            out.push(s.to_string());
        }
    }
    Ok(out)
}

/// Parse a completion for the given job kind.
pub fn parse_analysis(kind: AnalysisKind, raw: &str) -> Result<AnalysisResult, ParseError> {
    let map = parse_object(raw)?;
    match kind {
        AnalysisKind::Summary => Ok(AnalysisResult {
            content_type: None,
            related_entities: None,
            summary: required_text(&map, "summary")?,
        }),
        AnalysisKind::Classification => Ok(AnalysisResult {
            content_type: Some(required_text(&map, "content_type")?),
            related_entities: Some(required_string_list(&map, "related_entities")?),
            summary: required_text(&map, "summary")?,
        }),
    }
}

/// Parse a sensitivity-check completion.
///
/// Never fails: the refusal shortcut and every parse failure map to
/// [`SensitivityVerdict::unsafe_default`].
pub fn parse_sensitivity(raw: &str) -> SensitivityVerdict {
    if raw.trim() == UNSAFE_SHORTCUT {
        return SensitivityVerdict::unsafe_default();
    }

    let Ok(map) = parse_object(raw) else {
        return SensitivityVerdict::unsafe_default();
    };

    match map.get("safe") {
        Some(Value::Bool(true)) => {
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            SensitivityVerdict {
                safe: true,
                description,
            }
        }
        Some(Value::Bool(false)) => match required_text(&map, "description") {
            Ok(description) => SensitivityVerdict {
                safe: false,
                description,
            },
            Err(_) => SensitivityVerdict::unsafe_default(),
        },
        _ => SensitivityVerdict::unsafe_default(),
    }
}
