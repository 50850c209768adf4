// LogScope - core/parser.rs
//
// Tolerant JSON-lines log parsing. One JSON object per line is the happy
// path; several objects concatenated on one line are recovered with a
// brace-depth re-scan, and structurally valid objects missing required
// fields are produced as degraded entries rather than dropped.
// Core layer: accepts string content, never touches the filesystem.

use crate::core::model::{LogEntry, LogLevel, ParseResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::time::Instant;

/// Fixed diagnostic attached to entries missing `Timestamp` or `LogLevel`.
pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// Marker substring indicating a physical line carries more than one
/// concatenated JSON object.
const MULTI_OBJECT_MARKER: &str = "} {";

/// Parse raw file content into an ordered entry corpus plus line counts.
///
/// Never fails: per-candidate problems are represented in the counts
/// (`error_lines`) or on the entries themselves (`parse_error`), so a
/// structurally valid JSON object is never silently discarded.
/// Catastrophic failures (unreadable file, bad encoding) belong to the
/// load layer, which never calls this with invalid content.
pub fn parse_content(content: &str) -> ParseResult {
    let start = Instant::now();

    let mut entries: Vec<LogEntry> = Vec::new();
    let mut total_lines: u64 = 0;
    let mut parsed_lines: u64 = 0;
    let mut error_lines: u64 = 0;
    let mut next_id: u64 = 0;

    for line in content.lines() {
        total_lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.contains(MULTI_OBJECT_MARKER) {
            // Several objects crammed onto one line: recover each one,
            // all tagged with the same physical line number.
            for candidate in split_json_objects(trimmed) {
                match parse_record(candidate, total_lines, next_id) {
                    Some(entry) => {
                        entries.push(entry);
                        parsed_lines += 1;
                        next_id += 1;
                    }
                    None => error_lines += 1,
                }
            }
        } else {
            match parse_record(trimmed, total_lines, next_id) {
                Some(entry) => {
                    entries.push(entry);
                    parsed_lines += 1;
                    next_id += 1;
                }
                None => {
                    // Only lines that look like JSON count as errors;
                    // anything else is non-log noise (banners, headers).
                    if trimmed.starts_with('{') {
                        error_lines += 1;
                    }
                }
            }
        }
    }

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    tracing::debug!(
        entries = entries.len(),
        total = total_lines,
        parsed = parsed_lines,
        errors = error_lines,
        duration_ms,
        "Parse complete"
    );

    ParseResult {
        entries,
        total_lines,
        parsed_lines,
        error_lines,
        duration_ms,
    }
}

/// Split a line containing concatenated JSON objects into candidate
/// substrings by tracking brace depth: each time the depth returns to 0
/// the span from the opening brace to the matching close is emitted.
///
/// Braces inside string values are not special-cased; records produced
/// by structured loggers do not put unbalanced braces in scalar values,
/// and a miscount simply yields a candidate that fails to parse and is
/// counted as an error line.
fn split_json_objects(line: &str) -> Vec<&str> {
    let mut results = Vec::new();
    let mut depth: u32 = 0;
    let mut current_start: Option<usize> = None;

    for (i, ch) in line.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    current_start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(start) = current_start.take() {
                        results.push(&line[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    results
}

/// Parse one candidate string into a LogEntry.
///
/// Returns `None` only when the candidate cannot be recognised as a JSON
/// object at all. A valid object missing `Timestamp` or `LogLevel` still
/// produces an entry, tagged with `parse_error` and defaulted fields.
fn parse_record(raw: &str, line_number: u64, id: u64) -> Option<LogEntry> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;

    let state = obj.get("State").and_then(Value::as_object).cloned();
    let scopes = obj.get("Scopes").and_then(Value::as_array).cloned();

    let level = obj
        .get("LogLevel")
        .and_then(Value::as_str)
        .and_then(LogLevel::from_name)
        .unwrap_or(LogLevel::Information);

    let timestamp = non_empty_str(obj, "Timestamp");
    let has_required = timestamp.is_some() && non_empty_str(obj, "LogLevel").is_some();

    let (timestamp, message, parse_error) = if has_required {
        (
            timestamp.unwrap_or_default(),
            obj.get("Message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            None,
        )
    } else {
        // Degraded path: the record is still produced and counted as
        // parsed, with the load time standing in for the timestamp and
        // the raw text standing in for a missing message.
        (
            timestamp
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            non_empty_str(obj, "Message").unwrap_or_else(|| raw.to_string()),
            Some(MISSING_REQUIRED_FIELDS),
        )
    };

    let state_ref = state.as_ref();
    let scopes_ref = scopes.as_deref();

    Some(LogEntry {
        id,
        timestamp,
        event_id: obj.get("EventId").and_then(Value::as_i64).unwrap_or(0),
        level,
        category: non_empty_str(obj, "Category").unwrap_or_else(|| "Unknown".to_string()),
        message,
        exception: obj
            .get("Exception")
            .and_then(Value::as_str)
            .map(str::to_string),
        http_method: derived(state_ref, scopes_ref, &["HttpMethod", "Method"], "HttpMethod")
            .and_then(Value::as_str)
            .map(str::to_string),
        uri: derived(state_ref, scopes_ref, &["Uri"], "Uri")
            .and_then(Value::as_str)
            .map(str::to_string),
        status_code: derived(state_ref, scopes_ref, &["StatusCode"], "StatusCode")
            .and_then(Value::as_i64),
        elapsed_ms: derived(
            state_ref,
            scopes_ref,
            &["ElapsedMilliseconds"],
            "ElapsedMilliseconds",
        )
        .and_then(Value::as_f64),
        host: derived(state_ref, scopes_ref, &["Host"], "Host")
            .and_then(Value::as_str)
            .map(str::to_string),
        path: derived(state_ref, scopes_ref, &["Path"], "Path")
            .and_then(Value::as_str)
            .map(str::to_string),
        state,
        scopes,
        raw: raw.to_string(),
        line_number,
        parse_error,
    })
}

/// Non-empty string field accessor. Empty strings count as absent so a
/// record with `"Timestamp": ""` takes the degraded path.
fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve a derived field with fallback precedence: each of `state_keys`
/// in order on the `State` payload, then `scope_key` on the first scope.
fn derived<'a>(
    state: Option<&'a Map<String, Value>>,
    scopes: Option<&'a [Value]>,
    state_keys: &[&str],
    scope_key: &str,
) -> Option<&'a Value> {
    if let Some(state) = state {
        for key in state_keys {
            if let Some(v) = state.get(*key) {
                if !v.is_null() {
                    return Some(v);
                }
            }
        }
    }

    scopes
        .and_then(|s| s.first())
        .and_then(Value::as_object)
        .and_then(|first| first.get(scope_key))
        .filter(|v| !v.is_null())
}
