// LogScope - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Log Entry (normalised output of parsing)
// =============================================================================

/// A single parsed log record, normalised from one JSON object in the
/// source file.
///
/// This is the core data unit that flows through filtering, aggregation,
/// and display. The nested `State`/`Scopes` payloads are kept as ordered
/// JSON trees; the well-known HTTP keys are extracted once at parse time
/// so queries never re-traverse the nested structures.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Monotonically increasing unique ID within the load session.
    /// Used only for lookup/selection; carries no ordering meaning.
    pub id: u64,

    /// ISO-8601 timestamp string, exactly as found in the source record
    /// (or the load time for degraded entries). Source of truth for
    /// chronological ordering; parsed to a date only when a consumer
    /// needs a comparison.
    pub timestamp: String,

    /// Numeric event identifier. 0 when the record has none.
    pub event_id: i64,

    /// Normalised log level.
    pub level: LogLevel,

    /// Logger category. "Unknown" when the record has none.
    pub category: String,

    /// Message text. Empty when the record has none; falls back to the
    /// raw record text on the degraded-parse path.
    pub message: String,

    /// Structured state payload: arbitrary application-supplied context.
    pub state: Option<Map<String, Value>>,

    /// Ordered scope payloads, outermost first.
    pub scopes: Option<Vec<Value>>,

    /// Raw exception/stack-trace text.
    pub exception: Option<String>,

    // Derived fields, extracted from `state` with fallback to the first
    // scope so filtering and sorting are flat field accesses.
    pub http_method: Option<String>,
    pub uri: Option<String>,
    pub status_code: Option<i64>,
    pub elapsed_ms: Option<f64>,
    pub host: Option<String>,
    pub path: Option<String>,

    /// Original serialised text of the record, retained verbatim.
    pub raw: String,

    /// 1-based line number in the source file where the record began.
    pub line_number: u64,

    /// Diagnostic set when required fields were missing. The entry is
    /// still included in the corpus, never dropped.
    pub parse_error: Option<&'static str>,
}

// =============================================================================
// Log level
// =============================================================================

/// The fixed set of log levels, ordered least to most severe (with the
/// explicit `None` level last, matching the .NET logging convention the
/// source files use).
///
/// Level strings outside this set coerce to `Information` at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl LogLevel {
    /// Returns all variants in declaration order.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Information,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Critical,
            LogLevel::None,
        ]
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
            LogLevel::None => "None",
        }
    }

    /// Map a raw level string to a variant. Recognition is exact and
    /// case-sensitive; anything else is not a member of the fixed set.
    pub fn from_name(raw: &str) -> Option<LogLevel> {
        match raw {
            "Trace" => Some(LogLevel::Trace),
            "Debug" => Some(LogLevel::Debug),
            "Information" => Some(LogLevel::Information),
            "Warning" => Some(LogLevel::Warning),
            "Error" => Some(LogLevel::Error),
            "Critical" => Some(LogLevel::Critical),
            "None" => Some(LogLevel::None),
            _ => Option::None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Parse result
// =============================================================================

/// Result of parsing one file's content.
///
/// Line accounting: every physical line is counted in `total_lines`.
/// `parsed_lines` counts produced entries (a line carrying N concatenated
/// objects contributes N), `error_lines` counts malformed JSON candidates,
/// and the remainder is blank lines and non-JSON noise.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Entries in source file order. Never re-sorted in place.
    pub entries: Vec<LogEntry>,
    /// Physical lines in the input.
    pub total_lines: u64,
    /// Successfully produced entries (including degraded entries).
    pub parsed_lines: u64,
    /// Candidates that looked like JSON but failed to parse.
    pub error_lines: u64,
    /// Wall-clock duration of the parse in milliseconds.
    pub duration_ms: f64,
}

// =============================================================================
// Timestamp parsing
// =============================================================================

/// Parse an ISO-8601 timestamp string into a UTC instant.
///
/// Tries RFC 3339 first (explicit offset or Z), then naive date-times
/// with `T` or space separators and optional fractional seconds. Returns
/// `None` rather than erroring so query-time date comparisons stay
/// failure-free: an unparseable timestamp simply has no date.
pub fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.into());
    }

    let normalised = trimmed.replace('T', " ");
    NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|ndt| ndt.and_utc())
}
