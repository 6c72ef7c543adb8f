// SheetTriage - app/mod.rs
//
// Application layer: reference loading, session state, slicing and export.
// Dependencies: core and platform layers.

pub mod fetch;
pub mod pipeline;
pub mod state;
