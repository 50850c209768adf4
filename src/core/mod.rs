// LogScope - core/mod.rs
//
// Core business logic layer: entry model, tolerant JSON-lines parser,
// filter predicate engine, and aggregation.
// Pure logic: no I/O, no UI, no platform dependencies.

pub mod filter;
pub mod model;
pub mod parser;
pub mod stats;
