// SheetTriage - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Each subsystem owns an error enum; all of them convert into `TriageError`.
// Per-row date parse failures are absorbed in core::view and have no type here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all SheetTriage operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum TriageError {
    /// A reference list could not be fetched or parsed.
    Fetch(FetchError),

    /// The uploaded workbook could not be read.
    Workbook(WorkbookError),

    /// The input does not satisfy the expected column layout.
    Schema(SchemaError),

    /// Filter construction failed.
    Filter(FilterError),

    /// Export operation failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for TriageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Reference error: {e}"),
            Self::Workbook(e) => write!(f, "Processing error: {e}"),
            Self::Schema(e) => write!(f, "Schema error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for TriageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Workbook(e) => Some(e),
            Self::Schema(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Errors related to loading a reference list.
#[derive(Debug)]
pub enum FetchError {
    /// The HTTP request could not be completed.
    Http { url: String, source: reqwest::Error },

    /// The server answered with a non-success status.
    Status { url: String, status: u16 },

    /// A local reference file could not be read.
    Io { path: PathBuf, source: io::Error },

    /// The CSV body could not be parsed.
    Csv {
        location: String,
        source: csv::Error,
    },

    /// The source has no columns at all.
    EmptySource { location: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { url, source } => write!(f, "request to '{url}' failed: {source}"),
            Self::Status { url, status } => {
                write!(f, "'{url}' answered with HTTP status {status}")
            }
            Self::Io { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::Csv { location, source } => {
                write!(f, "invalid CSV in '{location}': {source}")
            }
            Self::EmptySource { location } => write!(f, "'{location}' contains no columns"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FetchError> for TriageError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

// ---------------------------------------------------------------------------
// Workbook errors
// ---------------------------------------------------------------------------

/// Errors reading the uploaded spreadsheet. These halt the run.
#[derive(Debug)]
pub enum WorkbookError {
    /// The file could not be opened or its format was not recognised.
    Open {
        path: PathBuf,
        source: calamine::Error,
    },

    /// The workbook has no worksheets.
    NoSheets { path: PathBuf },

    /// The first worksheet could not be decoded.
    Sheet {
        path: PathBuf,
        sheet: String,
        source: calamine::Error,
    },

    /// The first worksheet is empty (no header row).
    NoHeaderRow { path: PathBuf, sheet: String },
}

impl fmt::Display for WorkbookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open workbook '{}': {source}", path.display())
            }
            Self::NoSheets { path } => {
                write!(f, "workbook '{}' has no worksheets", path.display())
            }
            Self::Sheet {
                path,
                sheet,
                source,
            } => write!(
                f,
                "cannot read sheet '{sheet}' of '{}': {source}",
                path.display()
            ),
            Self::NoHeaderRow { path, sheet } => write!(
                f,
                "sheet '{sheet}' of '{}' has no header row",
                path.display()
            ),
        }
    }
}

impl std::error::Error for WorkbookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sheet { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<WorkbookError> for TriageError {
    fn from(e: WorkbookError) -> Self {
        Self::Workbook(e)
    }
}

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

/// The input sheet is narrower than the column contract requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A single required column is out of range.
    MissingColumn {
        role: &'static str,
        position: usize,
        available: usize,
    },

    /// Several projected columns are out of range.
    MissingColumns {
        positions: Vec<usize>,
        available: usize,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn {
                role,
                position,
                available,
            } => write!(
                f,
                "{role} column at position {position} is missing (sheet has {available} columns)"
            ),
            Self::MissingColumns {
                positions,
                available,
            } => write!(
                f,
                "columns at positions {positions:?} are missing (sheet has {available} columns)"
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<SchemaError> for TriageError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter operations.
#[derive(Debug)]
pub enum FilterError {
    /// The status alternation could not be compiled.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid status pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
        }
    }
}

impl From<FilterError> for TriageError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// XLSX serialisation error.
    Xlsx { source: rust_xlsxwriter::XlsxError },

    /// CSV serialisation error.
    Csv { source: csv::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },

    /// The table does not fit in a single worksheet.
    TooManyRows { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Xlsx { source } => write!(f, "XLSX export error: {source}"),
            Self::Csv { source } => write!(f, "CSV export error: {source}"),
            Self::Json { source } => write!(f, "JSON export error: {source}"),
            Self::TooManyRows { count, max } => write!(
                f,
                "Export of {count} rows exceeds the worksheet maximum of {max}. \
                 Narrow the status selection or use CSV."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Xlsx { source } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Json { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportError> for TriageError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(source: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx { source }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for TriageError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for SheetTriage results.
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_schema_error_message_lists_positions() {
        let err = SchemaError::MissingColumns {
            positions: vec![23, 24, 25],
            available: 22,
        };
        let msg = err.to_string();
        assert!(msg.contains("[23, 24, 25]"));
        assert!(msg.contains("22 columns"));
    }

    #[test]
    fn test_top_level_error_preserves_source_chain() {
        let err: TriageError = FetchError::Io {
            path: PathBuf::from("cidades.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert!(err.to_string().starts_with("Reference error:"));
        let fetch = err.source().expect("fetch error source");
        assert!(fetch.source().is_some());
    }

    #[test]
    fn test_status_error_has_no_source() {
        let err = FetchError::Status {
            url: "https://example.invalid/x.csv".to_string(),
            status: 404,
        };
        assert!(err.source().is_none());
        assert!(err.to_string().contains("404"));
    }
}
