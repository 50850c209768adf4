// LogScope - platform/config.rs
//
// Platform-specific directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for LogScope data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logscope/).
    pub config_dir: PathBuf,

    /// Data directory for column preferences and other session artefacts.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[loading]` section.
    pub loading: LoadingSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[loading]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoadingSection {
    /// Maximum accepted log file size in bytes.
    pub max_file_size_bytes: Option<u64>,
    /// Threshold above which files are memory-mapped instead of read
    /// into a heap buffer.
    pub large_file_threshold_bytes: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time.
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum accepted log file size in bytes.
    pub max_file_size: u64,
    /// Memory-map threshold in bytes.
    pub large_file_threshold: u64,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: constants::DEFAULT_MAX_FILE_SIZE,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// `ConfigError` warnings. If the file does not exist, returns defaults
/// with no warnings (first-run). If the file is unreadable or
/// unparseable, returns defaults with one warning -- the application
/// still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<ConfigError>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    let mut warnings: Vec<ConfigError> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let err = ConfigError::Io {
                path: config_path,
                source: e,
            };
            tracing::warn!("{err}. Using defaults.");
            warnings.push(err);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let err = ConfigError::TomlParse {
                path: config_path,
                source: e,
            };
            tracing::warn!("{err}. Using defaults.");
            warnings.push(err);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    // Validate each field against named constants, accumulating all errors.
    let mut config = AppConfig::default();

    // -- Loading: max_file_size_bytes --
    if let Some(size) = raw.loading.max_file_size_bytes {
        if (constants::MIN_MAX_FILE_SIZE..=constants::ABSOLUTE_MAX_FILE_SIZE).contains(&size) {
            config.max_file_size = size;
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "[loading] max_file_size_bytes".to_string(),
                value: size.to_string(),
                expected: format!(
                    "{}-{}",
                    constants::MIN_MAX_FILE_SIZE,
                    constants::ABSOLUTE_MAX_FILE_SIZE
                ),
            });
        }
    }

    // -- Loading: large_file_threshold_bytes --
    if let Some(threshold) = raw.loading.large_file_threshold_bytes {
        if threshold <= config.max_file_size {
            config.large_file_threshold = threshold;
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "[loading] large_file_threshold_bytes".to_string(),
                value: threshold.to_string(),
                expected: format!("at most the file size ceiling ({})", config.max_file_size),
            });
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "[logging] level".to_string(),
                value: level.clone(),
                expected: "one of: error, warn, info, debug, trace".to_string(),
            });
        }
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    (config, warnings)
}
