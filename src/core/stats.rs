// LogScope - core/stats.rs
//
// Aggregate statistics over the entry corpus: a single-pass reduction
// plus one sort for the time range. Independent of any filter; callers
// aggregate a filtered subsequence explicitly if that is what they want.
// Core layer: pure logic, no I/O or UI dependencies.

use crate::core::model::{parse_iso_timestamp, LogEntry, LogLevel};
use crate::util::constants::TOP_ENDPOINT_COUNT;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Latency profile of one endpoint, keyed by exact URI string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStat {
    pub uri: String,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub count: u64,
}

/// Call volume of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCalls {
    pub uri: String,
    pub count: u64,
}

/// The single slowest timed request in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowestRequest {
    pub uri: String,
    pub ms: f64,
}

/// Chronological extent of the corpus, as the original timestamp strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

/// Aggregate statistics for a corpus.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogStats {
    /// Entry count.
    pub total: usize,

    /// Occurrences per level. Every one of the seven fixed levels is
    /// present, zero-count levels included.
    pub counts_by_level: HashMap<LogLevel, u64>,

    /// Occurrences per category (unbounded key set).
    pub counts_by_category: HashMap<String, u64>,

    /// Mean elapsed milliseconds over timed entries; 0 when none.
    pub avg_elapsed_ms: f64,

    /// Slowest single timed request; first encountered wins ties.
    pub slowest_request: Option<SlowestRequest>,

    /// Endpoints with the highest max latency (not average), capped at
    /// five, ties broken by scan-encounter order.
    pub top_slow_endpoints: Vec<EndpointStat>,

    /// Endpoints with the highest call count, same cap and tie-break.
    pub top_called_endpoints: Vec<EndpointCalls>,

    /// Percentage (0-100) of status-carrying entries with status >= 400.
    /// Entries without a status code are in neither numerator nor
    /// denominator. 0 when no entry carries a status.
    pub http_error_rate: f64,

    /// Earliest and latest timestamp, or None for an empty corpus.
    pub time_range: Option<TimeRange>,
}

/// Per-endpoint running accumulator. Kept in a Vec in encounter order so
/// the top-N tie-break is deterministic; the HashMap only indexes it.
struct EndpointAccum {
    uri: String,
    total_ms: f64,
    max_ms: f64,
    count: u64,
}

/// Compute aggregate statistics over `entries`.
pub fn aggregate(entries: &[LogEntry]) -> LogStats {
    let mut counts_by_level: HashMap<LogLevel, u64> =
        LogLevel::all().iter().map(|l| (*l, 0)).collect();
    let mut counts_by_category: HashMap<String, u64> = HashMap::new();

    let mut endpoints: Vec<EndpointAccum> = Vec::new();
    let mut endpoint_index: HashMap<String, usize> = HashMap::new();

    let mut slowest: Option<SlowestRequest> = None;
    let mut total_elapsed_ms = 0.0;
    let mut elapsed_count: u64 = 0;
    let mut http_errors: u64 = 0;
    let mut http_total: u64 = 0;

    for entry in entries {
        *counts_by_level.entry(entry.level).or_insert(0) += 1;
        *counts_by_category
            .entry(entry.category.clone())
            .or_insert(0) += 1;

        if let Some(elapsed) = entry.elapsed_ms {
            total_elapsed_ms += elapsed;
            elapsed_count += 1;

            // Strict comparison: ties keep the first encountered.
            let is_new_max = slowest.as_ref().map_or(true, |s| elapsed > s.ms);
            if is_new_max {
                slowest = Some(SlowestRequest {
                    uri: entry
                        .uri
                        .clone()
                        .or_else(|| entry.path.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    ms: elapsed,
                });
            }

            if let Some(uri) = &entry.uri {
                let idx = *endpoint_index.entry(uri.clone()).or_insert_with(|| {
                    endpoints.push(EndpointAccum {
                        uri: uri.clone(),
                        total_ms: 0.0,
                        max_ms: 0.0,
                        count: 0,
                    });
                    endpoints.len() - 1
                });
                let accum = &mut endpoints[idx];
                accum.total_ms += elapsed;
                accum.count += 1;
                accum.max_ms = accum.max_ms.max(elapsed);
            }
        }

        if let Some(status) = entry.status_code {
            http_total += 1;
            if status >= 400 {
                http_errors += 1;
            }
        }
    }

    // Top slow: by max latency. The sort is stable and the accumulator
    // Vec is in encounter order, so equal maxima stay in scan order.
    let mut by_max: Vec<&EndpointAccum> = endpoints.iter().collect();
    by_max.sort_by(|a, b| b.max_ms.partial_cmp(&a.max_ms).unwrap_or(Ordering::Equal));
    let top_slow_endpoints = by_max
        .iter()
        .take(TOP_ENDPOINT_COUNT)
        .map(|e| EndpointStat {
            uri: e.uri.clone(),
            avg_ms: e.total_ms / e.count as f64,
            max_ms: e.max_ms,
            count: e.count,
        })
        .collect();

    let mut by_count: Vec<&EndpointAccum> = endpoints.iter().collect();
    by_count.sort_by(|a, b| b.count.cmp(&a.count));
    let top_called_endpoints = by_count
        .iter()
        .take(TOP_ENDPOINT_COUNT)
        .map(|e| EndpointCalls {
            uri: e.uri.clone(),
            count: e.count,
        })
        .collect();

    LogStats {
        total: entries.len(),
        counts_by_level,
        counts_by_category,
        avg_elapsed_ms: if elapsed_count > 0 {
            total_elapsed_ms / elapsed_count as f64
        } else {
            0.0
        },
        slowest_request: slowest,
        top_slow_endpoints,
        top_called_endpoints,
        http_error_rate: if http_total > 0 {
            http_errors as f64 / http_total as f64 * 100.0
        } else {
            0.0
        },
        time_range: compute_time_range(entries),
    }
}

/// Chronological extent of the corpus: sort entry timestamps by their
/// parsed date and report the original strings at either end. Entries
/// whose timestamp does not parse are left out of the ordering; when no
/// timestamp parses at all, the scan-order extremes stand in so a
/// non-empty corpus always reports a range.
fn compute_time_range(entries: &[LogEntry]) -> Option<TimeRange> {
    let mut dated: Vec<(chrono::DateTime<chrono::Utc>, &str)> = entries
        .iter()
        .filter_map(|e| parse_iso_timestamp(&e.timestamp).map(|ts| (ts, e.timestamp.as_str())))
        .collect();

    if dated.is_empty() {
        return Some(TimeRange {
            from: entries.first()?.timestamp.clone(),
            to: entries.last()?.timestamp.clone(),
        });
    }

    dated.sort_by_key(|(ts, _)| *ts);
    Some(TimeRange {
        from: dated.first()?.1.to_string(),
        to: dated.last()?.1.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_content;

    fn entry_lines(lines: &[&str]) -> Vec<LogEntry> {
        parse_content(&lines.join("\n")).entries
    }

    fn http_line(uri: &str, status: i64, elapsed: f64) -> String {
        format!(
            r#"{{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Information","Category":"Http.Request","Message":"req","State":{{"HttpMethod":"GET","Uri":"{uri}","StatusCode":{status},"ElapsedMilliseconds":{elapsed}}}}}"#
        )
    }

    #[test]
    fn test_empty_corpus() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_elapsed_ms, 0.0);
        assert_eq!(stats.http_error_rate, 0.0);
        assert!(stats.time_range.is_none());
        assert!(stats.slowest_request.is_none());
        // Zero-count levels are present, not omitted.
        assert_eq!(stats.counts_by_level.len(), 7);
        assert_eq!(stats.counts_by_level[&LogLevel::Critical], 0);
    }

    #[test]
    fn test_counts_by_level_and_category() {
        let entries = entry_lines(&[
            r#"{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Error","Category":"Db","Message":"a"}"#,
            r#"{"Timestamp":"2024-01-15T09:00:01Z","LogLevel":"Error","Category":"Db","Message":"b"}"#,
            r#"{"Timestamp":"2024-01-15T09:00:02Z","LogLevel":"Warning","Category":"Cache","Message":"c"}"#,
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.counts_by_level[&LogLevel::Error], 2);
        assert_eq!(stats.counts_by_level[&LogLevel::Warning], 1);
        assert_eq!(stats.counts_by_level[&LogLevel::Trace], 0);
        assert_eq!(stats.counts_by_category["Db"], 2);
        assert_eq!(stats.counts_by_category["Cache"], 1);
    }

    /// Statuses [200, 404, absent]: the status-less entry is excluded
    /// from both numerator and denominator, so the rate is 50%.
    #[test]
    fn test_http_error_rate_denominator_excludes_statusless() {
        let entries = entry_lines(&[
            &http_line("/a", 200, 10.0),
            &http_line("/b", 404, 10.0),
            r#"{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Information","Category":"App","Message":"no status"}"#,
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.http_error_rate, 50.0);
    }

    #[test]
    fn test_avg_elapsed() {
        let entries = entry_lines(&[&http_line("/a", 200, 100.0), &http_line("/b", 200, 300.0)]);
        let stats = aggregate(&entries);
        assert_eq!(stats.avg_elapsed_ms, 200.0);
    }

    /// Slowest request ties keep the first encountered; uri falls back
    /// to path, then "Unknown".
    #[test]
    fn test_slowest_request_tie_keeps_first() {
        let entries = entry_lines(&[&http_line("/first", 200, 500.0), &http_line("/second", 200, 500.0)]);
        let stats = aggregate(&entries);
        assert_eq!(
            stats.slowest_request,
            Some(SlowestRequest {
                uri: "/first".to_string(),
                ms: 500.0
            })
        );
    }

    #[test]
    fn test_slowest_request_uri_fallback() {
        let entries = entry_lines(&[
            r#"{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Information","Category":"Bg","Message":"job","State":{"ElapsedMilliseconds":80.0,"Path":"/jobs/nightly"}}"#,
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.slowest_request.unwrap().uri, "/jobs/nightly");

        let entries = entry_lines(&[
            r#"{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Information","Category":"Bg","Message":"job","State":{"ElapsedMilliseconds":80.0}}"#,
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.slowest_request.unwrap().uri, "Unknown");
    }

    /// Top-slow ranks by max latency, not average.
    #[test]
    fn test_top_slow_ranked_by_max_not_average() {
        // /spiky: one 900ms outlier among fast calls (low average).
        // /steady: consistently 500ms (higher average than /spiky).
        let entries = entry_lines(&[
            &http_line("/spiky", 200, 10.0),
            &http_line("/spiky", 200, 10.0),
            &http_line("/spiky", 200, 900.0),
            &http_line("/steady", 200, 500.0),
            &http_line("/steady", 200, 500.0),
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.top_slow_endpoints[0].uri, "/spiky");
        assert_eq!(stats.top_slow_endpoints[0].max_ms, 900.0);
        assert!((stats.top_slow_endpoints[0].avg_ms - 306.666).abs() < 0.01);
        assert_eq!(stats.top_slow_endpoints[1].uri, "/steady");
    }

    /// Two endpoints with identical max latency appear in first-encounter
    /// order.
    #[test]
    fn test_top_slow_tie_break_is_encounter_order() {
        let entries = entry_lines(&[
            &http_line("/b-first", 200, 250.0),
            &http_line("/a-second", 200, 250.0),
            &http_line("/c-third", 200, 250.0),
        ]);
        let stats = aggregate(&entries);
        let uris: Vec<&str> = stats
            .top_slow_endpoints
            .iter()
            .map(|e| e.uri.as_str())
            .collect();
        assert_eq!(uris, vec!["/b-first", "/a-second", "/c-third"]);
    }

    #[test]
    fn test_top_called_capped_at_five() {
        let lines: Vec<String> = (0..8)
            .flat_map(|i| {
                // endpoint i gets i+1 calls
                (0..=i).map(move |_| http_line(&format!("/e{i}"), 200, 1.0))
            })
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let entries = entry_lines(&refs);
        let stats = aggregate(&entries);

        assert_eq!(stats.top_called_endpoints.len(), 5);
        assert_eq!(stats.top_called_endpoints[0].uri, "/e7");
        assert_eq!(stats.top_called_endpoints[0].count, 8);
        assert_eq!(stats.top_called_endpoints[4].uri, "/e3");
    }

    /// Untimed entries contribute to neither endpoint stats nor averages.
    #[test]
    fn test_untimed_entries_excluded_from_latency() {
        let entries = entry_lines(&[
            r#"{"Timestamp":"2024-01-15T09:00:00Z","LogLevel":"Information","Category":"Http.Request","Message":"r","State":{"HttpMethod":"GET","Uri":"/a","StatusCode":200}}"#,
            &http_line("/b", 200, 60.0),
        ]);
        let stats = aggregate(&entries);
        assert_eq!(stats.avg_elapsed_ms, 60.0);
        assert_eq!(stats.top_slow_endpoints.len(), 1);
        assert_eq!(stats.top_slow_endpoints[0].uri, "/b");
    }

    /// Time range spans the chronological extremes even when the corpus
    /// is not in timestamp order.
    #[test]
    fn test_time_range_sorted_chronologically() {
        let entries = entry_lines(&[
            r#"{"Timestamp":"2024-01-15T12:00:00Z","LogLevel":"Information","Category":"App","Message":"mid"}"#,
            r#"{"Timestamp":"2024-01-15T08:00:00Z","LogLevel":"Information","Category":"App","Message":"early"}"#,
            r#"{"Timestamp":"2024-01-15T18:00:00Z","LogLevel":"Information","Category":"App","Message":"late"}"#,
        ]);
        let stats = aggregate(&entries);
        let range = stats.time_range.unwrap();
        assert_eq!(range.from, "2024-01-15T08:00:00Z");
        assert_eq!(range.to, "2024-01-15T18:00:00Z");
    }

    /// A corpus whose timestamps all fail to parse still reports a range
    /// (scan-order extremes); only an empty corpus has none.
    #[test]
    fn test_time_range_falls_back_to_scan_order() {
        let entries = entry_lines(&[
            r#"{"Timestamp":"around noon","LogLevel":"Information","Category":"App","Message":"a"}"#,
            r#"{"Timestamp":"later that day","LogLevel":"Information","Category":"App","Message":"b"}"#,
        ]);
        let stats = aggregate(&entries);
        let range = stats.time_range.unwrap();
        assert_eq!(range.from, "around noon");
        assert_eq!(range.to, "later that day");
    }
}
