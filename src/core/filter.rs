// LogScope - core/filter.rs
//
// Query predicate engine for log entries.
// All active criteria are AND-combined; membership sets are OR within.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::model::{parse_iso_timestamp, LogEntry, LogLevel};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// The analyst's current query. Immutable per evaluation; replaced
/// wholesale on change.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Levels to include. An empty set passes nothing; callers that
    /// mean "no level filter" must keep all levels selected, which is
    /// what `Default` produces.
    pub levels: HashSet<LogLevel>,

    /// Case-insensitive substring search over message, category, uri,
    /// and the serialised state/scopes payloads. Empty = no filter.
    pub search_text: String,

    /// Categories to include (empty = all).
    pub categories: HashSet<String>,

    /// Only entries with an HTTP method.
    pub http_only: bool,

    /// Only entries qualifying as HTTP errors (status >= 400, or no
    /// status and an Error/Critical level).
    pub errors_only: bool,

    /// Minimum elapsed milliseconds. Entries without a measured elapsed
    /// time are not excluded by this criterion.
    pub slow_threshold_ms: Option<f64>,

    /// Inclusive date range bounds. Either side may be unbounded.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            levels: LogLevel::all().iter().copied().collect(),
            search_text: String::new(),
            categories: HashSet::new(),
            http_only: false,
            errors_only: false,
            slow_threshold_ms: None,
            date_from: None,
            date_to: None,
        }
    }
}

impl FilterSpec {
    /// Returns true when no criterion restricts the corpus.
    pub fn is_default(&self) -> bool {
        self.levels.len() == LogLevel::all().len()
            && self.search_text.is_empty()
            && self.categories.is_empty()
            && !self.http_only
            && !self.errors_only
            && self.slow_threshold_ms.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// Apply the filter to a slice of entries, returning indices of matching
/// entries in original order.
///
/// Returns indices into the entries slice rather than copies; this keeps
/// the corpus immutable and lets display layers virtual-scroll the view.
/// Evaluation is fresh on every call: the searchable serialisation of
/// state/scopes is rebuilt per entry, never cached.
pub fn apply_filters(entries: &[LogEntry], spec: &FilterSpec) -> Vec<usize> {
    if spec.is_default() {
        return (0..entries.len()).collect();
    }

    let search_lower = spec.search_text.to_lowercase();

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches_all(entry, spec, &search_lower))
        .map(|(idx, _)| idx)
        .collect()
}

/// Check if a single entry matches every active criterion.
fn matches_all(entry: &LogEntry, spec: &FilterSpec, search_lower: &str) -> bool {
    // Level membership (empty set passes nothing).
    if !spec.levels.contains(&entry.level) {
        return false;
    }

    // Text search over message, category, uri, and nested payloads.
    if !search_lower.is_empty() && !searchable_text(entry).contains(search_lower) {
        return false;
    }

    // Category membership.
    if !spec.categories.is_empty() && !spec.categories.contains(&entry.category) {
        return false;
    }

    // HTTP-only.
    if spec.http_only && entry.http_method.is_none() {
        return false;
    }

    // HTTP-errors-only. A present status below 400 disqualifies the
    // entry regardless of level; with no status the level decides.
    if spec.errors_only {
        match entry.status_code {
            Some(status) if status < 400 => return false,
            Some(_) => {}
            None => {
                if !matches!(entry.level, LogLevel::Error | LogLevel::Critical) {
                    return false;
                }
            }
        }
    }

    // Slow threshold: untimed entries pass unconditionally.
    if let (Some(threshold), Some(elapsed)) = (spec.slow_threshold_ms, entry.elapsed_ms) {
        if elapsed < threshold {
            return false;
        }
    }

    // Inclusive date range. An entry timestamp that does not parse as a
    // date passes: interactive filtering never fails on malformed input.
    if spec.date_from.is_some() || spec.date_to.is_some() {
        if let Some(ts) = parse_iso_timestamp(&entry.timestamp) {
            if let Some(from) = spec.date_from {
                if ts < from {
                    return false;
                }
            }
            if let Some(to) = spec.date_to {
                if ts > to {
                    return false;
                }
            }
        }
    }

    true
}

/// The lower-cased haystack the text search runs against. State and
/// scopes are serialised on every evaluation; their shape is open-ended,
/// so no cached serialisation can be trusted to stay representative.
fn searchable_text(entry: &LogEntry) -> String {
    let state_str = entry
        .state
        .as_ref()
        .and_then(|s| serde_json::to_string(s).ok())
        .unwrap_or_default();
    let scopes_str = entry
        .scopes
        .as_ref()
        .and_then(|s| serde_json::to_string(s).ok())
        .unwrap_or_default();

    format!(
        "{} {} {} {} {}",
        entry.message,
        entry.category,
        entry.uri.as_deref().unwrap_or(""),
        state_str,
        scopes_str
    )
    .to_lowercase()
}
