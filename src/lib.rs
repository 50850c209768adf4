// LogScope - lib.rs
//
// Library entry point. LogScope is the ingestion and query core of a
// structured-log viewer: it parses JSON-lines application log files into
// an in-memory entry corpus and answers filter/aggregation queries over
// that corpus. Presentation (grids, dashboards, file dialogs, export
// menus) consumes this crate but lives elsewhere.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
