// LogScope - app/mod.rs
//
// Application layer: session state, background loading, column
// preferences. Dependencies: core and platform layers.

pub mod columns;
pub mod load;
pub mod state;
