// SheetTriage - platform/mod.rs
//
// Platform abstraction layer: config directories and config.toml, workbook
// decoding, file-system writes.
// May use core types. Must NOT depend on: app.

pub mod config;
pub mod fs;
pub mod workbook;
