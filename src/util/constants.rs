// SheetTriage - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Column positions, reference headers and status vocabulary live here so the
// input schema contract is explicit in one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "SheetTriage";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "SheetTriage";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Input schema (zero-based column positions in the uploaded sheet)
// =============================================================================

/// Column G: locality (city) of the service order.
pub const LOCALITY_COLUMN: usize = 6;

/// Column V: status text ("Pendente", "Postergada", ...).
pub const STATUS_COLUMN: usize = 21;

/// Upper bound for an explicitly pinned team column.
pub const MAX_TEAM_COLUMN: usize = 255;

/// Columns B, G, H, Z, J, V, X, Y, W projected into the view, in output order.
pub const VIEW_COLUMN_POSITIONS: [usize; 9] = [1, 6, 7, 25, 9, 21, 23, 24, 22];

// =============================================================================
// Reference sources
// =============================================================================

/// Default CSV export of the allowed-localities sheet.
pub const DEFAULT_LOCALITIES_SOURCE: &str =
    "https://docs.google.com/spreadsheets/d/1s6KPkKB45R_c6Gc8U6QlgKe3yRvzHBbzbLEf4PXcTQk/export?format=csv";

/// Default CSV export of the team/service descriptions sheet.
pub const DEFAULT_TEAMS_SOURCE: &str =
    "https://docs.google.com/spreadsheets/d/1piSbAO3yHdUpEQ7fCQp7UBTMC2apeMNXwEVCPZabmXM/export?format=csv";

/// Header of the reconnection column in the teams sheet.
pub const RECONNECTION_HEADER: &str = "RELIGAÇÃO";

/// Header of the inspection column in the teams sheet.
pub const INSPECTION_HEADER: &str = "FISCALIZAÇÃO";

/// Normalised text that spreadsheet exports use for a missing value.
pub const NAN_LITERAL: &str = "NAN";

/// Default HTTP timeout for reference fetches.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Minimum accepted fetch timeout.
pub const MIN_FETCH_TIMEOUT_SECS: u64 = 1;

/// Maximum accepted fetch timeout.
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// View preparation
// =============================================================================

/// Output date format for the deadline column.
pub const DEADLINE_FORMAT: &str = "%d/%m/%Y";

/// Text values treated as "missing" in free-text columns.
pub const NULL_LITERALS: &[&str] = &["nan", "NaT", "None"];

/// Status substring that keeps the non-execution commentary.
pub const DEFERRED_MARKER: &str = "postergada";

/// Excel serial day zero (serial 1 = 1900-01-01 with the 1900 leap bug).
pub const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

// =============================================================================
// Export
// =============================================================================

/// Timestamp appended to every exported file name.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Stem of the "all filtered rows" export.
pub const ALL_RECORDS_STEM: &str = "todos_registros";

/// Stem of the "processed, no status filter" export.
pub const PROCESSED_STEM: &str = "processado_completo";

/// Excel number format used for date cells.
pub const XLSX_DATE_FORMAT: &str = "dd/mm/yyyy";

/// Excel's hard row limit (including the header row).
pub const MAX_XLSX_ROWS: usize = 1_048_576;

// =============================================================================
// Logging / config
// =============================================================================

/// Default log level when neither RUST_LOG nor --debug nor config is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default output directory for exported slices.
pub const DEFAULT_OUTPUT_DIR: &str = ".";
