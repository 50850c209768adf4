// LogScope - tests/e2e_load.rs
//
// End-to-end tests for the load and analysis pipeline.
//
// These tests exercise the real filesystem, real background-thread
// loading, real serde_json parsing, and real chrono timestamp handling:
// no mocks, no stubs. This exercises the full path from a raw JSON-lines
// file on disk to structured LogEntry objects, a filtered view, and
// aggregate statistics.

use logscope::app::load::{load_file, LoadConfig, LoadManager, LoadOutcome};
use logscope::app::state::Session;
use logscope::core::filter::{apply_filters, FilterSpec};
use logscope::core::model::LogLevel;
use logscope::core::stats::aggregate;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load the sample fixture synchronously.
fn load_sample() -> logscope::core::model::ParseResult {
    let (result, _, _) =
        load_file(&fixture("sample.jsonl"), &LoadConfig::default()).expect("fixture should load");
    result
}

// =============================================================================
// Load and parse E2E
// =============================================================================

/// The fixture file contains 11 physical lines: 9 well-formed records
/// (one line carries two concatenated objects), one degraded record,
/// one malformed JSON line, and one non-JSON banner.
#[test]
fn e2e_fixture_line_accounting() {
    let result = load_sample();

    assert_eq!(result.total_lines, 11);
    assert_eq!(result.parsed_lines, 10);
    assert_eq!(result.error_lines, 1);
    assert_eq!(result.entries.len(), 10);
}

/// The concatenated line yields two entries sharing one line number.
#[test]
fn e2e_multi_object_line_shares_line_number() {
    let result = load_sample();

    let cache: Vec<_> = result
        .entries
        .iter()
        .filter(|e| e.category == "Shop.Cache")
        .collect();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache[0].line_number, 6);
    assert_eq!(cache[1].line_number, 6);
    assert_eq!(cache[0].message, "Cache warmed");
    assert_eq!(cache[1].level, LogLevel::Debug);
}

/// The record missing Timestamp/LogLevel survives as a degraded entry.
#[test]
fn e2e_degraded_record_is_kept() {
    let result = load_sample();

    let degraded: Vec<_> = result
        .entries
        .iter()
        .filter(|e| e.parse_error.is_some())
        .collect();
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].message, "orphan record");
    assert_eq!(degraded[0].level, LogLevel::Information);
    assert!(!degraded[0].timestamp.is_empty());
}

/// HTTP fields come from State or, failing that, the first scope.
#[test]
fn e2e_http_fields_extracted_from_state_and_scopes() {
    let result = load_sample();

    let checkout = result
        .entries
        .iter()
        .find(|e| e.uri.as_deref() == Some("/api/checkout"))
        .expect("checkout entry present");
    assert_eq!(checkout.http_method.as_deref(), Some("POST"));
    assert_eq!(checkout.status_code, Some(500));
    assert_eq!(checkout.elapsed_ms, Some(310.2));
    assert_eq!(checkout.host.as_deref(), Some("shop.example.com"));

    let cart = result
        .entries
        .iter()
        .find(|e| e.uri.as_deref() == Some("/api/cart"))
        .expect("cart entry present");
    assert_eq!(cart.http_method.as_deref(), Some("DELETE"));
    assert!(cart.status_code.is_none());
}

// =============================================================================
// Filter E2E
// =============================================================================

#[test]
fn e2e_http_only_filter() {
    let result = load_sample();

    let mut spec = FilterSpec::default();
    spec.http_only = true;
    let matched = apply_filters(&result.entries, &spec);

    assert_eq!(matched.len(), 4);
    assert!(matched
        .iter()
        .all(|&i| result.entries[i].http_method.is_some()));
}

/// errors_only keeps status >= 400 plus status-less Error/Critical
/// entries; a present status below 400 always disqualifies.
#[test]
fn e2e_errors_only_filter() {
    let result = load_sample();

    let mut spec = FilterSpec::default();
    spec.errors_only = true;
    let matched = apply_filters(&result.entries, &spec);

    let messages: Vec<_> = matched
        .iter()
        .map(|&i| result.entries[i].message.as_str())
        .collect();
    assert_eq!(matched.len(), 2, "got: {messages:?}");
    assert!(messages.contains(&"POST /api/checkout responded 500"));
    assert!(messages.contains(&"Payment provider unreachable"));
}

/// Search descends into the serialised State payload.
#[test]
fn e2e_search_reaches_nested_state() {
    let result = load_sample();

    let mut spec = FilterSpec::default();
    spec.search_text = "shop.example.com".to_string();
    let matched = apply_filters(&result.entries, &spec);

    assert_eq!(matched.len(), 3);
}

/// Date range bounds are inclusive at both ends.
#[test]
fn e2e_date_range_filter() {
    use logscope::core::model::parse_iso_timestamp;
    let result = load_sample();

    let mut spec = FilterSpec::default();
    spec.date_from = parse_iso_timestamp("2024-02-10T08:02:01.008Z");
    spec.date_to = parse_iso_timestamp("2024-02-10T08:03:00.001Z");
    let matched = apply_filters(&result.entries, &spec);

    let in_range: Vec<_> = matched
        .iter()
        .map(|&i| result.entries[i].message.as_str())
        .collect();
    assert!(in_range.contains(&"POST /api/checkout responded 500"));
    assert!(in_range.contains(&"Cache statistics flushed"));
    assert!(!in_range.contains(&"Application started"));
}

// =============================================================================
// Statistics E2E
// =============================================================================

#[test]
fn e2e_stats_over_full_corpus() {
    let result = load_sample();
    let stats = aggregate(&result.entries);

    assert_eq!(stats.total, 10);
    // Five records declare Information; the degraded record coerces to
    // it as well.
    assert_eq!(stats.counts_by_level[&LogLevel::Information], 6);
    assert_eq!(stats.counts_by_level[&LogLevel::Error], 1);
    assert_eq!(stats.counts_by_level[&LogLevel::Critical], 1);
    assert_eq!(stats.counts_by_level[&LogLevel::Trace], 0);

    // Three entries carry a measured elapsed time: 42.5, 120.0, 310.2.
    assert!((stats.avg_elapsed_ms - 157.566_666).abs() < 0.001);
    let slowest = stats.slowest_request.as_ref().expect("slowest present");
    assert_eq!(slowest.uri, "/api/checkout");
    assert_eq!(slowest.ms, 310.2);

    // Three entries carry a status code; one is >= 400.
    assert!((stats.http_error_rate - 100.0 / 3.0).abs() < 0.001);

    let range = stats.time_range.as_ref().expect("time range present");
    assert_eq!(range.from, "2024-02-10T08:00:00.000Z");
}

#[test]
fn e2e_endpoint_rankings() {
    let result = load_sample();
    let stats = aggregate(&result.entries);

    // Slow ranking orders by worst-case latency, not averages.
    assert_eq!(stats.top_slow_endpoints[0].uri, "/api/checkout");
    assert_eq!(stats.top_slow_endpoints[1].uri, "/api/orders");
    assert_eq!(stats.top_slow_endpoints[1].max_ms, 120.0);
    assert!((stats.top_slow_endpoints[1].avg_ms - 81.25).abs() < 0.001);

    // Call ranking covers timed sightings; the untimed /api/cart entry
    // contributes to no latency ranking.
    assert_eq!(stats.top_called_endpoints[0].uri, "/api/orders");
    assert_eq!(stats.top_called_endpoints[0].count, 2);
}

// =============================================================================
// Background load and session E2E
// =============================================================================

/// Full pipeline: background load, corpus installation, filtering and
/// statistics through the session.
#[test]
fn e2e_session_pipeline() {
    let mut manager = LoadManager::new();
    manager.start_load(fixture("sample.jsonl"), LoadConfig::default());

    let outcome = {
        let mut found = None;
        for _ in 0..200 {
            if let Some(outcome) = manager.poll_outcome() {
                found = Some(outcome);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        found.expect("load did not complete within 2 s")
    };

    let mut session = Session::new(logscope::app::columns::default_columns());
    match outcome {
        LoadOutcome::Loaded {
            result,
            file_name,
            file_size,
        } => session.set_corpus(result, file_name, file_size),
        LoadOutcome::Failed { error } => panic!("unexpected failure: {error}"),
    }

    assert_eq!(session.file_name.as_deref(), Some("sample.jsonl"));
    assert_eq!(session.entry_count(), 10);
    assert_eq!(session.filtered_count(), 10);

    session.toggle_level(LogLevel::Information);
    session.toggle_level(LogLevel::Debug);
    assert_eq!(session.filtered_count(), 3); // Error, Warning, Critical

    // Statistics stay corpus-wide while the view is narrowed.
    let stats = session.stats();
    assert_eq!(stats.total, 10);
    assert_eq!(stats.counts_by_level[&LogLevel::Warning], 1);

    session.reset_filters();
    assert_eq!(session.filtered_count(), 10);

    let categories = session.unique_categories();
    assert!(categories.contains(&"Shop.Http".to_string()));
    assert!(categories.windows(2).all(|w| w[0] <= w[1]), "sorted");
}
