// LogScope - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogScope";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogScope";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Load limits
// =============================================================================

/// Default maximum size of a log file accepted for loading, in bytes.
/// Files above this are rejected before any parsing starts.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100 MB

/// Minimum user-configurable file size ceiling.
pub const MIN_MAX_FILE_SIZE: u64 = 1024 * 1024; // 1 MB

/// Hard upper bound on the file size ceiling (prevents configuration
/// mistakes from admitting files the corpus cannot reasonably hold).
pub const ABSOLUTE_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024; // 1 GB

/// File size threshold in bytes above which the loader switches from
/// `fs::read_to_string` to a memory-mapped read.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 32 * 1024 * 1024; // 32 MB

// =============================================================================
// Aggregation
// =============================================================================

/// Number of endpoints reported in the top-slow and top-called lists.
pub const TOP_ENDPOINT_COUNT: usize = 5;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Column preference file name (stored in the platform data directory).
pub const COLUMN_PREFS_FILE_NAME: &str = "columns.json";
