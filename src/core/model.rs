// SheetTriage - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::SchemaError;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Cell / Table
// =============================================================================

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Convenience constructor for text cells.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the value as display text.
    ///
    /// Integral numbers drop the decimal point so that numeric codes compare
    /// equal to their textual form in the reference lists.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format_number(*v),
            Cell::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            Cell::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format(constants::DEADLINE_FORMAT).to_string()
                } else {
                    dt.format("%d/%m/%Y %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Trimmed, uppercased text used for reference-set lookups.
    pub fn normalized(&self) -> String {
        normalize(&self.as_text())
    }
}

fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Trim and uppercase a value for set membership.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// An ordered table with a header row. Columns are addressed by position.
///
/// Rows may be shorter than the header; missing trailing cells read as empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (row, col); out-of-range positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Index of the first column with the given header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// All values of one column, in row order.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(col).unwrap_or(&EMPTY_CELL))
    }

    /// New table holding only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// New table with the given columns in the given order, renamed.
    ///
    /// `positions` and `headers` must have the same length.
    pub fn project(&self, positions: &[usize], headers: Vec<String>) -> Table {
        debug_assert_eq!(positions.len(), headers.len());
        let rows = self
            .rows
            .iter()
            .map(|r| {
                positions
                    .iter()
                    .map(|&p| r.get(p).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Table { headers, rows }
    }

    /// New table without the named column. Unknown names return a copy.
    pub fn without_column(&self, header: &str) -> Table {
        let Some(idx) = self.column_index(header) else {
            return self.clone();
        };
        let mut headers = self.headers.clone();
        headers.remove(idx);
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                if idx < r.len() {
                    r.remove(idx);
                }
                r
            })
            .collect();
        Table { headers, rows }
    }

    /// Append a column. `values` must have one entry per row.
    pub fn push_column(&mut self, header: impl Into<String>, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let width = self.headers.len();
        self.headers.push(header.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width, Cell::Empty);
            row.push(value);
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }
}

// =============================================================================
// Reference sets
// =============================================================================

/// A set of normalised (trimmed, uppercased) reference values.
///
/// Empty strings and the "NAN" literal are never members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    values: HashSet<String>,
}

impl ReferenceSet {
    /// Build a set from raw values, normalising and discarding blanks.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = values
            .into_iter()
            .map(|v| normalize(v.as_ref()))
            .filter(|v| !v.is_empty() && v != constants::NAN_LITERAL)
            .collect();
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Membership test for an already-normalised value.
    pub fn contains(&self, normalized: &str) -> bool {
        self.values.contains(normalized)
    }

    /// Membership test for a cell, normalising it first.
    pub fn contains_cell(&self, cell: &Cell) -> bool {
        self.contains(&cell.normalized())
    }

    pub fn union(&self, other: &ReferenceSet) -> ReferenceSet {
        ReferenceSet {
            values: self.values.union(&other.values).cloned().collect(),
        }
    }
}

/// Team/service descriptions split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamReferences {
    pub reconnection: ReferenceSet,
    pub inspection: ReferenceSet,
}

impl TeamReferences {
    /// All recognised service descriptions.
    pub fn union(&self) -> ReferenceSet {
        self.reconnection.union(&self.inspection)
    }

    /// Classify a service value. Reconnection is checked first.
    pub fn classify(&self, service: &Cell) -> ServiceCategory {
        let key = service.normalized();
        if self.reconnection.contains(&key) {
            ServiceCategory::Reconnection
        } else if self.inspection.contains(&key) {
            ServiceCategory::Inspection
        } else {
            ServiceCategory::Undefined
        }
    }
}

/// Both reference lists as loaded for one processing pass.
#[derive(Debug, Clone, Default)]
pub struct References {
    pub localities: ReferenceSet,
    pub teams: TeamReferences,

    /// Non-fatal problems met while loading (e.g. a degraded fetch).
    pub warnings: Vec<String>,
}

// =============================================================================
// Service category
// =============================================================================

/// Service category assigned to every row of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceCategory {
    Reconnection,
    Inspection,
    Undefined,
}

impl ServiceCategory {
    /// All variants in output order.
    pub fn all() -> &'static [ServiceCategory] {
        &[
            ServiceCategory::Reconnection,
            ServiceCategory::Inspection,
            ServiceCategory::Undefined,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Reconnection => "RELIGAÇÃO",
            ServiceCategory::Inspection => "FISCALIZAÇÃO",
            ServiceCategory::Undefined => "INDEFINIDO",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Status vocabulary
// =============================================================================

/// Recognised status keywords for the status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKeyword {
    Pending,
    Deferred,
    Scheduled,
}

impl StatusKeyword {
    pub fn all() -> &'static [StatusKeyword] {
        &[
            StatusKeyword::Pending,
            StatusKeyword::Deferred,
            StatusKeyword::Scheduled,
        ]
    }

    /// Text matched against the status column.
    pub fn label(&self) -> &'static str {
        match self {
            StatusKeyword::Pending => "Pendente",
            StatusKeyword::Deferred => "Postergada",
            StatusKeyword::Scheduled => "Programado",
        }
    }
}

impl fmt::Display for StatusKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusKeyword {
    type Err = String;

    /// Accepts the Portuguese labels or the English names, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendente" | "pending" => Ok(StatusKeyword::Pending),
            "postergada" | "deferred" => Ok(StatusKeyword::Deferred),
            "programado" | "scheduled" => Ok(StatusKeyword::Scheduled),
            other => Err(format!(
                "unknown status '{other}'. Expected one of: Pendente, Postergada, Programado"
            )),
        }
    }
}

// =============================================================================
// Column schema
// =============================================================================

/// Explicit positional contract for the uploaded sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Position of the locality column.
    pub locality_column: usize,

    /// Position of the status column.
    pub status_column: usize,

    /// Pinned team/service column. None = detect by value intersection.
    pub team_column: Option<usize>,

    /// Positions projected into the view, in `ViewColumn` order.
    pub view_positions: [usize; 9],

    /// Fail on missing columns (true) or skip/drop them with a warning (false).
    pub strict: bool,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            locality_column: constants::LOCALITY_COLUMN,
            status_column: constants::STATUS_COLUMN,
            team_column: None,
            view_positions: constants::VIEW_COLUMN_POSITIONS,
            strict: true,
        }
    }
}

impl ColumnSchema {
    /// Default positions, degrading on missing columns.
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Check that `position` exists in `table`.
    pub fn require(
        &self,
        role: &'static str,
        position: usize,
        table: &Table,
    ) -> Result<(), SchemaError> {
        if position < table.column_count() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumn {
                role,
                position,
                available: table.column_count(),
            })
        }
    }
}
