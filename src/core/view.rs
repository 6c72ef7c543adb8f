// SheetTriage - core/view.rs
//
// View preparation: projects the status-filtered table onto the nine
// reporting columns, normalises the deadline, classifies each row into a
// service category, clears commentary that only matters for deferred orders,
// and computes the number of days overdue.
// Core layer: pure logic. `today` is always passed in.

use crate::core::model::{Cell, ColumnSchema, ServiceCategory, Table, TeamReferences};
use crate::util::constants;
use crate::util::error::SchemaError;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Header of the category column appended to the view.
pub const CATEGORY_HEADER: &str = "Tipo_Equipe";

/// Header of the overdue-days column appended to the view.
pub const OVERDUE_HEADER: &str = "Atrasados";

/// Reporting columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewColumn {
    Order,
    Locality,
    Registration,
    Deadline,
    Service,
    Status,
    OpinionNonExecution,
    ReasonNonExecution,
    OpinionRequester,
}

impl ViewColumn {
    pub fn all() -> &'static [ViewColumn; 9] {
        &[
            ViewColumn::Order,
            ViewColumn::Locality,
            ViewColumn::Registration,
            ViewColumn::Deadline,
            ViewColumn::Service,
            ViewColumn::Status,
            ViewColumn::OpinionNonExecution,
            ViewColumn::ReasonNonExecution,
            ViewColumn::OpinionRequester,
        ]
    }

    /// Header written to exported files.
    pub fn header(&self) -> &'static str {
        match self {
            ViewColumn::Order => "Ordem_Servico",
            ViewColumn::Locality => "Cidades",
            ViewColumn::Registration => "Matricula",
            ViewColumn::Deadline => "Data_Limite",
            ViewColumn::Service => "Serviço",
            ViewColumn::Status => "Situacao",
            ViewColumn::OpinionNonExecution => "Parecer_Nao_Execucao",
            ViewColumn::ReasonNonExecution => "Motivo_Nao_Execucao",
            ViewColumn::OpinionRequester => "Parecer_Solicitante",
        }
    }
}

/// The prepared view: the projected table plus each row's category.
///
/// `table` contains the `Tipo_Equipe` column; `categories[i]` is the typed
/// category of row `i`.
#[derive(Debug, Clone)]
pub struct ViewTable {
    pub table: Table,
    pub categories: Vec<ServiceCategory>,
}

impl ViewTable {
    /// Rows of one category, without the category column.
    pub fn category(&self, category: ServiceCategory) -> Table {
        let mut idx = 0;
        self.table
            .retain_rows(|_| {
                let keep = self.categories[idx] == category;
                idx += 1;
                keep
            })
            .without_column(CATEGORY_HEADER)
    }

    /// All rows, without the category column.
    pub fn all_rows(&self) -> Table {
        self.table.without_column(CATEGORY_HEADER)
    }

    pub fn count(&self, category: ServiceCategory) -> usize {
        self.categories.iter().filter(|&&c| c == category).count()
    }
}

/// Build the view for a status-filtered table.
///
/// Returns `Ok(None)` for an empty input. A strict schema fails when any
/// projected position is missing; a lenient one drops the missing columns.
pub fn prepare_view(
    table: &Table,
    teams: &TeamReferences,
    schema: &ColumnSchema,
    today: NaiveDate,
) -> Result<Option<ViewTable>, SchemaError> {
    if table.is_empty() {
        return Ok(None);
    }

    let available = table.column_count();
    let missing: Vec<usize> = schema
        .view_positions
        .iter()
        .copied()
        .filter(|&p| p >= available)
        .collect();
    if !missing.is_empty() {
        if schema.strict {
            return Err(SchemaError::MissingColumns {
                positions: missing,
                available,
            });
        }
        tracing::warn!(missing = ?missing, available, "View columns missing; dropping them");
    }

    let (positions, columns): (Vec<usize>, Vec<ViewColumn>) = schema
        .view_positions
        .iter()
        .copied()
        .zip(ViewColumn::all().iter().copied())
        .filter(|(p, _)| *p < available)
        .unzip();
    let headers = columns.iter().map(|c| c.header().to_string()).collect();
    let mut view = table.project(&positions, headers);
    let col_of = |c: ViewColumn| columns.iter().position(|&x| x == c);

    if let Some(col) = col_of(ViewColumn::Deadline) {
        for row in view.rows_mut() {
            row[col] = format_deadline(&row[col]);
        }
    }

    let categories: Vec<ServiceCategory> = match col_of(ViewColumn::Service) {
        Some(col) => view.column(col).map(|cell| teams.classify(cell)).collect(),
        None => vec![ServiceCategory::Undefined; view.row_count()],
    };

    let status_col = col_of(ViewColumn::Status);
    let commentary: Vec<usize> = [ViewColumn::OpinionNonExecution, ViewColumn::ReasonNonExecution]
        .into_iter()
        .filter_map(col_of)
        .collect();
    let requester_col = col_of(ViewColumn::OpinionRequester);

    for row in view.rows_mut() {
        let deferred = status_col.map(|c| is_deferred(&row[c])).unwrap_or(true);
        for &col in &commentary {
            row[col] = if deferred {
                clean_free_text(&row[col])
            } else {
                Cell::Empty
            };
        }
        if let Some(col) = requester_col {
            row[col] = clean_free_text(&row[col]);
        }
    }

    let category_cells = categories
        .iter()
        .map(|c| Cell::text(c.label()))
        .collect();
    view.push_column(CATEGORY_HEADER, category_cells);

    if let Some(col) = col_of(ViewColumn::Deadline) {
        let overdue = view
            .column(col)
            .map(|cell| match overdue_days(&cell.as_text(), today) {
                Some(days) => Cell::text(days.to_string()),
                None => Cell::Empty,
            })
            .collect();
        view.push_column(OVERDUE_HEADER, overdue);
    }

    tracing::info!(
        rows = view.row_count(),
        reconnection = categories
            .iter()
            .filter(|&&c| c == ServiceCategory::Reconnection)
            .count(),
        inspection = categories
            .iter()
            .filter(|&&c| c == ServiceCategory::Inspection)
            .count(),
        "View prepared"
    );

    Ok(Some(ViewTable {
        table: view,
        categories,
    }))
}

/// Normalise a deadline cell to `DD/MM/YYYY` text; unparseable becomes empty.
pub fn format_deadline(cell: &Cell) -> Cell {
    if cell.is_empty() {
        return Cell::Empty;
    }
    match parse_day_first(cell) {
        Some(date) => Cell::text(date.format(constants::DEADLINE_FORMAT).to_string()),
        None => {
            tracing::trace!(value = %cell.as_text(), "Unparseable deadline; left empty");
            Cell::Empty
        }
    }
}

/// Days between `deadline` (`DD/MM/YYYY`) and `today`, only when positive.
pub fn overdue_days(deadline: &str, today: NaiveDate) -> Option<i64> {
    let deadline = deadline.trim();
    if deadline.is_empty() || !deadline.contains('/') {
        return None;
    }
    let date = NaiveDate::parse_from_str(deadline, constants::DEADLINE_FORMAT).ok()?;
    let days = (today - date).num_days();
    (days > 0).then_some(days)
}

/// Interpret a cell as a date, reading ambiguous text day-first.
pub fn parse_day_first(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty | Cell::Bool(_) => None,
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Number(serial) => excel_serial_to_date(*serial),
        Cell::Text(s) => parse_day_first_text(s),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

fn parse_day_first_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || constants::NULL_LITERALS.contains(&s) {
        return None;
    }

    // Four-digit-year formats first; a parsed year below 1000 means the
    // input really had a two-digit year.
    let full_year = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
        .filter(|d| chrono::Datelike::year(d) >= 1000);

    full_year.or_else(|| {
        SHORT_YEAR_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    })
}

/// Excel serial day number to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= 2_958_466.0 {
        return None;
    }
    let (y, m, d) = constants::EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn is_deferred(status: &Cell) -> bool {
    status
        .as_text()
        .to_lowercase()
        .contains(constants::DEFERRED_MARKER)
}

/// Missing values and null literals become empty; anything else is kept as text.
fn clean_free_text(cell: &Cell) -> Cell {
    let text = cell.as_text();
    if text.is_empty() || constants::NULL_LITERALS.contains(&text.as_str()) {
        Cell::Empty
    } else {
        Cell::Text(text)
    }
}
