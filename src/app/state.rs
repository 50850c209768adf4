// LogScope - app/state.rs
//
// Session state: the loaded corpus, the active filter, the filtered
// view, the selected entry, and column preferences. This is the single
// mutable root the embedding application drives; the core layer stays
// pure functions over it.

use crate::app::columns::ColumnConfig;
use crate::core::filter::{apply_filters, FilterSpec};
use crate::core::model::{LogEntry, LogLevel, ParseResult};
use crate::core::stats::{aggregate, LogStats};

/// One analysis session: a loaded file and everything derived from it.
///
/// The corpus is replaced wholesale on each load; filters and selection
/// reset with it, while column preferences survive across loads.
pub struct Session {
    /// The immutable corpus from the last completed load.
    entries: Vec<LogEntry>,

    /// Name of the loaded file, for display.
    pub file_name: Option<String>,

    /// Size in bytes of the loaded file.
    pub file_size: u64,

    /// Line accounting from the last parse.
    pub total_lines: u64,
    pub parsed_lines: u64,
    pub error_lines: u64,

    /// Wall-clock parse duration in milliseconds.
    pub parse_duration_ms: f64,

    /// The active query.
    filter: FilterSpec,

    /// Indices into `entries` matching the active query, in corpus order.
    filtered_indices: Vec<usize>,

    /// Stable id of the selected entry, if any. Ids survive re-filtering;
    /// positions do not.
    pub selected_id: Option<u64>,

    /// Grid column preferences.
    pub columns: Vec<ColumnConfig>,
}

impl Session {
    /// Create an empty session with the given column preferences.
    pub fn new(columns: Vec<ColumnConfig>) -> Self {
        Self {
            entries: Vec::new(),
            file_name: None,
            file_size: 0,
            total_lines: 0,
            parsed_lines: 0,
            error_lines: 0,
            parse_duration_ms: 0.0,
            filter: FilterSpec::default(),
            filtered_indices: Vec::new(),
            selected_id: None,
            columns,
        }
    }

    /// Replace the corpus with a freshly parsed file.
    ///
    /// Filters reset to pass-everything and the selection clears; column
    /// preferences are retained.
    pub fn set_corpus(&mut self, result: ParseResult, file_name: String, file_size: u64) {
        tracing::info!(
            file = %file_name,
            entries = result.entries.len(),
            total_lines = result.total_lines,
            error_lines = result.error_lines,
            "Corpus replaced"
        );

        self.entries = result.entries;
        self.file_name = Some(file_name);
        self.file_size = file_size;
        self.total_lines = result.total_lines;
        self.parsed_lines = result.parsed_lines;
        self.error_lines = result.error_lines;
        self.parse_duration_ms = result.duration_ms;
        self.filter = FilterSpec::default();
        self.selected_id = None;
        self.refresh();
    }

    /// Discard the corpus and all derived state. Columns are retained.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.file_name = None;
        self.file_size = 0;
        self.total_lines = 0;
        self.parsed_lines = 0;
        self.error_lines = 0;
        self.parse_duration_ms = 0.0;
        self.filter = FilterSpec::default();
        self.filtered_indices.clear();
        self.selected_id = None;
    }

    /// The active query.
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Replace the query wholesale and re-evaluate the view.
    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.refresh();
    }

    /// Reset the query to pass-everything.
    pub fn reset_filters(&mut self) {
        self.filter = FilterSpec::default();
        self.refresh();
    }

    /// Toggle one level's membership in the level criterion.
    pub fn toggle_level(&mut self, level: LogLevel) {
        if !self.filter.levels.remove(&level) {
            self.filter.levels.insert(level);
        }
        self.refresh();
    }

    /// Number of entries in the corpus.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries matching the active query.
    pub fn filtered_count(&self) -> usize {
        self.filtered_indices.len()
    }

    /// Entries matching the active query, in corpus order.
    pub fn filtered_entries(&self) -> Vec<&LogEntry> {
        self.filtered_indices
            .iter()
            .map(|&idx| &self.entries[idx])
            .collect()
    }

    /// Aggregate statistics over the full corpus.
    ///
    /// Statistics are independent of the active filter: narrowing the
    /// view never changes the population the numbers describe.
    pub fn stats(&self) -> LogStats {
        aggregate(&self.entries)
    }

    /// Distinct categories present in the corpus, sorted.
    pub fn unique_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.category.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        categories.sort();
        categories
    }

    /// Select an entry by its stable id (or clear the selection).
    pub fn select(&mut self, id: Option<u64>) {
        self.selected_id = id;
    }

    /// The selected entry, if it still exists in the corpus.
    pub fn selected_entry(&self) -> Option<&LogEntry> {
        let id = self.selected_id?;
        self.entries.iter().find(|e| e.id == id)
    }

    /// Toggle a column's visibility by field name.
    pub fn toggle_column(&mut self, field: &str) {
        if let Some(col) = self.columns.iter_mut().find(|c| c.field == field) {
            col.visible = !col.visible;
        }
    }

    /// Re-evaluate the filtered view against the current query.
    fn refresh(&mut self) {
        self.filtered_indices = apply_filters(&self.entries, &self.filter);
        tracing::debug!(
            matched = self.filtered_indices.len(),
            total = self.entries.len(),
            "Filter applied"
        );
    }
}
