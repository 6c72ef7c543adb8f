// SheetTriage - core/mod.rs
//
// Core business logic layer: table model, reference parsing, filters,
// view preparation, serialisation.
// Must NOT depend on: platform or app. No network or file-system I/O.

pub mod export;
pub mod filter;
pub mod model;
pub mod reference;
pub mod status;
pub mod view;
