use lingopane_core::{Error, Meaning, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Structured translation recovered from a model response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTranslation {
    pub translation: String,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub meanings: Option<BTreeMap<String, Meaning>>,
}

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

static DETECTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)detected language\s*[:\-]?\s*([A-Za-z][A-Za-z ]*[A-Za-z])").unwrap());

/// Best-effort extraction of a structured translation from free-form model
/// output.
///
/// Strategy, in order: a JSON object inside a fenced code block, then the
/// first bare `{...}` span, then a degraded plain-text recovery that takes
/// the first line which is neither a JSON delimiter nor a fence marker.
/// Only when all of those fail does this return an error.
pub fn parse_model_response(raw: &str) -> Result<ParsedTranslation> {
    if let Some(span) = json_span(raw) {
        match serde_json::from_str::<ParsedTranslation>(span) {
            Ok(parsed) if !parsed.translation.is_empty() => return Ok(parsed),
            Ok(_) => debug!("JSON object had an empty translation field"),
            Err(e) => debug!(error = %e, "JSON span did not parse as a translation"),
        }
    }

    recover_plain_text(raw)
        .ok_or_else(|| Error::Parse("response format was unexpected".to_string()))
}

/// Locate a JSON object in the raw text: fenced block first, then the first
/// brace-balanced span.
fn json_span(raw: &str) -> Option<&str> {
    if let Some(caps) = FENCE_RE.captures(raw) {
        return caps.get(1).map(|m| m.as_str());
    }
    brace_span(raw)
}

fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Degraded recovery: the first non-empty line that is neither a JSON
/// delimiter nor a fence marker becomes the translation, and a
/// "detected language: X" phrase is pulled out if one exists anywhere in
/// the text.
fn recover_plain_text(raw: &str) -> Option<ParsedTranslation> {
    let line = raw.lines().map(str::trim).find(|line| {
        !line.is_empty()
            && !line.starts_with("```")
            && !matches!(line.chars().next(), Some('{' | '}' | '[' | ']' | '`'))
            && !line.chars().all(|c| "{}[],:\"'".contains(c))
    })?;

    let translation = line.trim_matches(|c| c == '"' || c == '\'').to_string();
    if translation.is_empty() {
        return None;
    }

    let detected_language = DETECTED_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    Some(ParsedTranslation {
        translation,
        detected_language,
        meanings: None,
    })
}
