// LogScope - app/load.rs
//
// Load lifecycle management. Reads and parses one log file on a
// background thread, delivering a single result-or-error message to the
// interactive thread via an mpsc channel.
//
// Architecture:
//   - `LoadManager` lives on the interactive thread; `load_file` runs on
//     a background thread.
//   - Exactly one load is in flight at a time. There is no mid-parse
//     cancellation: starting a new load replaces the channel, so a stale
//     response from a superseded load is simply never received
//     (last-request-wins).
//   - Transient I/O errors are retried with capped backoff; large files
//     are memory-mapped instead of copied into a heap buffer.

use crate::core::model::ParseResult;
use crate::core::parser;
use crate::util::constants;
use crate::util::error::LoadError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Retry limits for transient I/O errors.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Size limits applied before reading a file.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Files above this size are rejected outright.
    pub max_file_size: u64,
    /// Files above this size are memory-mapped.
    pub large_file_threshold: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_file_size: constants::DEFAULT_MAX_FILE_SIZE,
            large_file_threshold: constants::DEFAULT_LARGE_FILE_THRESHOLD,
        }
    }
}

impl From<&crate::platform::config::AppConfig> for LoadConfig {
    fn from(config: &crate::platform::config::AppConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            large_file_threshold: config.large_file_threshold,
        }
    }
}

/// Terminal message of one load operation: either the complete result or
/// a single error. There is no streaming or partial delivery.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Load and parse completed; the caller owns the full corpus.
    Loaded {
        result: ParseResult,
        file_name: String,
        file_size: u64,
    },
    /// Catastrophic failure; no entries are available.
    Failed { error: String },
}

/// Manages a load operation on a background thread.
pub struct LoadManager {
    /// Channel receiver for the interactive thread to poll. Replaced on
    /// every `start_load`, which is what discards stale responses.
    outcome_rx: Option<mpsc::Receiver<LoadOutcome>>,
}

impl LoadManager {
    pub fn new() -> Self {
        Self { outcome_rx: None }
    }

    /// Whether a load has been started and its outcome not yet consumed.
    pub fn in_flight(&self) -> bool {
        self.outcome_rx.is_some()
    }

    /// Start loading `path` on a background thread.
    ///
    /// If a previous load is still running, its eventual response goes to
    /// a disconnected channel and is dropped; only the newest request's
    /// outcome is ever observed.
    pub fn start_load(&mut self, path: PathBuf, config: LoadConfig) {
        tracing::info!(file = %path.display(), "Load started");

        let (tx, rx) = mpsc::channel();
        self.outcome_rx = Some(rx);

        std::thread::spawn(move || {
            let outcome = match load_file(&path, &config) {
                Ok((result, file_name, file_size)) => LoadOutcome::Loaded {
                    result,
                    file_name,
                    file_size,
                },
                Err(e) => LoadOutcome::Failed {
                    error: e.to_string(),
                },
            };
            // Receiver replaced or dropped means this load was superseded.
            let _ = tx.send(outcome);
        });
    }

    /// Poll for the outcome without blocking. Returns `None` while the
    /// load is still running (or none was started). Consuming the
    /// outcome ends the in-flight state.
    ///
    /// A worker that dies without sending (channel disconnected) is
    /// reported as a failed load rather than leaving the manager
    /// in-flight forever.
    pub fn poll_outcome(&mut self) -> Option<LoadOutcome> {
        match self.outcome_rx.as_ref()?.try_recv() {
            Ok(outcome) => {
                self.outcome_rx = None;
                Some(outcome)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.outcome_rx = None;
                tracing::warn!("Load worker terminated without a result");
                Some(LoadOutcome::Failed {
                    error: "Load worker terminated without a result".to_string(),
                })
            }
        }
    }
}

impl Default for LoadManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Synchronous load pipeline
// =============================================================================

/// Read and parse a log file: size check, content read, parse.
///
/// Fails atomically: any error here means no entries at all. Per-line
/// problems inside readable content are counted by the parser, never
/// raised from here.
pub fn load_file(
    path: &Path,
    config: &LoadConfig,
) -> Result<(ParseResult, String, u64), LoadError> {
    let metadata = std::fs::metadata(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file_size = metadata.len();

    if file_size > config.max_file_size {
        return Err(LoadError::FileTooLarge {
            path: path.to_path_buf(),
            size: file_size,
            max_size: config.max_file_size,
        });
    }

    let content = read_file_content(path, file_size >= config.large_file_threshold)?;
    let result = parser::parse_content(&content);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::info!(
        file = %path.display(),
        bytes = file_size,
        entries = result.entries.len(),
        errors = result.error_lines,
        duration_ms = result.duration_ms,
        "Load complete"
    );

    Ok((result, file_name, file_size))
}

/// Read the full content of a file as a UTF-8 string.
///
/// Large files use `memmap2`, which avoids copying the entire file into
/// heap memory before the UTF-8 check. Small files use
/// `fs::read_to_string` with transient-error retries.
fn read_file_content(path: &Path, is_large: bool) -> Result<String, LoadError> {
    if is_large {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    }
}

fn read_large_file(path: &Path) -> Result<String, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    // SAFETY: the file is read-only and we do not mutate the map. We
    // accept the documented risk that external modification of the file
    // during the map's lifetime could produce undefined behaviour, which
    // is acceptable for a viewer reading already-written log files.
    let mmap = unsafe {
        memmap2::Mmap::map(&file).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
    };
    std::str::from_utf8(&mmap)
        .map(|s| s.to_string())
        .map_err(|e| LoadError::InvalidEncoding {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Read a small file with transient-error retries.
fn read_small_file_with_retry(path: &Path) -> Result<String, LoadError> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => {
                return Err(LoadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    Err(LoadError::Io {
        path: path.to_path_buf(),
        source: last_err.unwrap_or_else(|| io::Error::other("Unknown read error")),
    })
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
