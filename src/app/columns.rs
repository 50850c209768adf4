// LogScope - app/columns.rs
//
// Column visibility preferences: which grid columns the analyst has
// shown or hidden, persisted between sessions.
//
// Design principles:
// - Preferences are saved atomically (write temp, then rename) so a
//   crash during save never corrupts the previous good file.
// - Load errors are silently discarded (corrupt or incompatible files
//   just fall back to defaults rather than surfacing errors).
// - Persisted columns are merged against the canonical default list on
//   load so columns added in newer versions appear for users with an
//   older preference file.

use crate::util::constants::COLUMN_PREFS_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks.
///
/// Increment this constant whenever `ColumnPrefs` gains or removes fields
/// in a breaking way. Version mismatches silently discard the file.
pub const PREFS_VERSION: u32 = 1;

/// One grid column: the entry field it shows and its display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Entry field identifier (stable across versions).
    pub field: String,
    /// Header text shown in the grid.
    pub header: String,
    /// Whether the column is currently shown.
    pub visible: bool,
    /// Column width in logical pixels.
    pub width: f32,
}

impl ColumnConfig {
    fn new(field: &str, header: &str, visible: bool, width: f32) -> Self {
        Self {
            field: field.to_string(),
            header: header.to_string(),
            visible,
            width,
        }
    }
}

/// The canonical column list with default visibility.
pub fn default_columns() -> Vec<ColumnConfig> {
    vec![
        ColumnConfig::new("Timestamp", "Timestamp", true, 180.0),
        ColumnConfig::new("LogLevel", "Level", true, 100.0),
        ColumnConfig::new("Category", "Category", true, 250.0),
        ColumnConfig::new("EventId", "Event ID", false, 80.0),
        ColumnConfig::new("Message", "Message", true, 400.0),
        ColumnConfig::new("HttpMethod", "Method", true, 80.0),
        ColumnConfig::new("Host", "Host", true, 180.0),
        ColumnConfig::new("Path", "Path", true, 200.0),
        ColumnConfig::new("Uri", "URI", false, 300.0),
        ColumnConfig::new("StatusCode", "Status", true, 80.0),
        ColumnConfig::new("ElapsedMilliseconds", "Duration (ms)", true, 120.0),
    ]
}

/// On-disk shape of the preference file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnPrefs {
    /// Schema version. Must equal `PREFS_VERSION` to be accepted.
    pub version: u32,
    /// The persisted column states.
    pub columns: Vec<ColumnConfig>,
}

/// Resolve the preference file path from the platform data directory.
pub fn prefs_path(data_dir: &Path) -> PathBuf {
    data_dir.join(COLUMN_PREFS_FILE_NAME)
}

/// Save `columns` to `path` atomically (write temp, then rename).
///
/// Creates all parent directories as needed. Returns a descriptive error
/// string suitable for a tracing warn! call; the caller decides whether
/// to surface it (typically it is logged and ignored).
pub fn save(columns: &[ColumnConfig], path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "cannot create preferences directory '{}': {e}",
                parent.display()
            )
        })?;
    }

    let prefs = ColumnPrefs {
        version: PREFS_VERSION,
        columns: columns.to_vec(),
    };
    let json = serde_json::to_string_pretty(&prefs)
        .map_err(|e| format!("failed to serialise column preferences: {e}"))?;

    // Atomic write: write to a sibling temp file then rename. A crash
    // between write and rename loses the new preferences but never
    // corrupts the previous ones.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes()).map_err(|e| {
        format!(
            "failed to write preferences temp file '{}': {e}",
            tmp.display()
        )
    })?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!(
            "failed to finalise preferences file '{}': {e}",
            path.display()
        )
    })?;

    tracing::debug!(path = %path.display(), "Column preferences saved");
    Ok(())
}

/// Load column preferences from `path`, merged against the defaults.
///
/// Returns the default column list on any error (file not found, JSON
/// parse failure, version mismatch). The caller always gets a complete,
/// current column list.
pub fn load(path: &Path) -> Vec<ColumnConfig> {
    let Some(prefs) = read_prefs(path) else {
        return default_columns();
    };
    merge_with_defaults(&prefs.columns)
}

fn read_prefs(path: &Path) -> Option<ColumnPrefs> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read preferences file");
            }
        })
        .ok()?;

    let prefs: ColumnPrefs = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Preferences file is malformed, using defaults"
            );
        })
        .ok()?;

    if prefs.version != PREFS_VERSION {
        tracing::warn!(
            found = prefs.version,
            expected = PREFS_VERSION,
            "Preferences file version mismatch, using defaults"
        );
        return None;
    }

    tracing::debug!(path = %path.display(), "Column preferences loaded");
    Some(prefs)
}

/// Merge persisted column states against the canonical default list.
///
/// The defaults define the column set and order; a persisted entry for a
/// known field overrides its state. Persisted fields no longer in the
/// defaults are dropped, and new default columns appear with their
/// default state.
pub fn merge_with_defaults(persisted: &[ColumnConfig]) -> Vec<ColumnConfig> {
    default_columns()
        .into_iter()
        .map(|default_col| {
            persisted
                .iter()
                .find(|c| c.field == default_col.field)
                .cloned()
                .unwrap_or(default_col)
        })
        .collect()
}
