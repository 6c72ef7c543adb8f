// SheetTriage - platform/workbook.rs
//
// Decoding of the uploaded spreadsheet into a `Table`.
// Uses calamine's format auto-detection (xlsx, xlsm, xlsb, xls, ods).
// Only the first worksheet is read; its first row is the header.

use crate::core::model::{Cell, Table};
use crate::util::error::WorkbookError;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// Read the first sheet of the workbook at `path`.
pub fn read_workbook(path: &Path) -> Result<Table, WorkbookError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| WorkbookError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| WorkbookError::NoSheets {
            path: path.to_path_buf(),
        })?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| WorkbookError::Sheet {
            path: path.to_path_buf(),
            sheet: sheet.clone(),
            source: e,
        })?;

    // Leading blank columns are trimmed by calamine; pad them back so that
    // positional column access matches the sheet letters.
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| WorkbookError::NoHeaderRow {
        path: path.to_path_buf(),
        sheet: sheet.clone(),
    })?;

    let headers: Vec<String> = std::iter::repeat(String::new())
        .take(leading)
        .chain(header_row.iter().map(|c| convert_cell(c).as_text().trim().to_string()))
        .collect();

    let rows: Vec<Vec<Cell>> = rows
        .map(|r| {
            std::iter::repeat(Cell::Empty)
                .take(leading)
                .chain(r.iter().map(convert_cell))
                .collect()
        })
        .collect();

    tracing::info!(
        path = %path.display(),
        sheet = %sheet,
        rows = rows.len(),
        columns = headers.len(),
        "Workbook loaded"
    );

    Ok(Table::new(headers, rows))
}

/// Map a calamine cell to the table model.
pub fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_scalar_cells() {
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(
            convert_cell(&Data::String("Pendente".to_string())),
            Cell::text("Pendente")
        );
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Bool(true));
    }

    #[test]
    fn test_convert_iso_date() {
        let cell = convert_cell(&Data::DateTimeIso("2024-01-15".to_string()));
        assert_eq!(cell.as_text(), "15/01/2024");
    }

    #[test]
    fn test_xlsx_round_trip() {
        let at = |h, m, s| {
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap()
        };
        let table = Table::new(
            ["Ordem", "Valor", "Ativo", "Vencimento", "Prazo", "Obs"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            vec![
                vec![
                    Cell::text("OS-1"),
                    Cell::Number(12.5),
                    Cell::Bool(true),
                    Cell::DateTime(at(13, 45, 10)),
                    Cell::DateTime(at(0, 0, 0)),
                    Cell::Empty,
                ],
                vec![
                    Cell::text("OS-2"),
                    Cell::Empty,
                    Cell::Bool(false),
                    Cell::Empty,
                    Cell::Number(3.0),
                    Cell::text("fim"),
                ],
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.xlsx");
        let bytes = crate::core::export::export_xlsx(&table).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_workbook(&path).unwrap(), table);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let result = read_workbook(Path::new("/nonexistent/sheettriage/input.xlsx"));
        assert!(matches!(result, Err(WorkbookError::Open { .. })));
    }
}
