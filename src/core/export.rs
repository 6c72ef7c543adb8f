// SheetTriage - core/export.rs
//
// XLSX, CSV and JSON serialisation of tables.
// Pure serialisation: column order and row order follow the input table.
// Core layer: returns bytes or writes to any Write trait object.

use crate::core::model::{Cell, Table};
use crate::util::constants;
use crate::util::error::ExportError;
use rust_xlsxwriter::{Format, Workbook};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output file format for exported slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "unknown export format '{other}'. Expected xlsx, csv or json"
            )),
        }
    }
}

/// Serialise `table` in the requested format.
pub fn export_table(table: &Table, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Xlsx => export_xlsx(table),
        ExportFormat::Csv => {
            let mut buf = Vec::new();
            export_csv(table, &mut buf)?;
            Ok(buf)
        }
        ExportFormat::Json => {
            let mut buf = Vec::new();
            export_json(table, &mut buf)?;
            Ok(buf)
        }
    }
}

/// Serialise `table` to an XLSX workbook with a single sheet.
///
/// Row 0 holds the headers. Empty cells are left blank; dates get a
/// day-first number format so they stay real dates in the spreadsheet.
pub fn export_xlsx(table: &Table) -> Result<Vec<u8>, ExportError> {
    if table.row_count() + 1 > constants::MAX_XLSX_ROWS {
        return Err(ExportError::TooManyRows {
            count: table.row_count(),
            max: constants::MAX_XLSX_ROWS - 1,
        });
    }

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(constants::XLSX_DATE_FORMAT);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (col, header) in table.headers().iter().enumerate() {
        sheet.write_string(0, col as u16, header)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let xl_row = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate().take(table.column_count()) {
            let xl_col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    sheet.write_string(xl_row, xl_col, s)?;
                }
                Cell::Number(v) => {
                    sheet.write_number(xl_row, xl_col, *v)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(xl_row, xl_col, *b)?;
                }
                Cell::DateTime(dt) => {
                    sheet.write_datetime_with_format(xl_row, xl_col, dt, &date_format)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        bytes = bytes.len(),
        "XLSX serialised"
    );
    Ok(bytes)
}

/// Export `table` as CSV: header record, then one record per row.
///
/// Returns the number of data rows written.
pub fn export_csv<W: Write>(table: &Table, writer: W) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(table.headers())
        .map_err(|e| ExportError::Csv { source: e })?;

    let width = table.column_count();
    let mut count = 0;
    for row in 0..table.row_count() {
        let record: Vec<String> = (0..width).map(|c| table.cell(row, c).as_text()).collect();
        csv_writer
            .write_record(&record)
            .map_err(|e| ExportError::Csv { source: e })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Csv {
        source: csv::Error::from(e),
    })?;

    Ok(count)
}

/// Export `table` as a JSON array of objects keyed by header.
pub fn export_json<W: Write>(table: &Table, writer: W) -> Result<usize, ExportError> {
    let records: Vec<serde_json::Value> = (0..table.row_count())
        .map(|row| {
            let object = table
                .headers()
                .iter()
                .enumerate()
                .map(|(c, h)| (h.clone(), cell_to_json(table.cell(row, c))))
                .collect::<serde_json::Map<_, _>>();
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records).map_err(|e| ExportError::Json { source: e })?;
    Ok(records.len())
}

fn cell_to_json(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Empty => serde_json::Value::Null,
        Cell::Text(s) => serde_json::Value::String(s.clone()),
        Cell::Number(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Cell::Bool(b) => serde_json::Value::Bool(*b),
        Cell::DateTime(_) => serde_json::Value::String(cell.as_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table() -> Table {
        Table::new(
            vec!["Ordem".to_string(), "Cidade".to_string(), "Valor".to_string()],
            vec![
                vec![Cell::text("OS-1"), Cell::text("Recife, PE"), Cell::Number(10.0)],
                vec![Cell::text("OS-2"), Cell::Empty, Cell::Number(2.5)],
            ],
        )
    }

    #[test]
    fn test_csv_export() {
        let mut buf = Vec::new();
        let count = export_csv(&make_table(), &mut buf).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Ordem,Cidade,Valor");
        assert_eq!(lines[1], "OS-1,\"Recife, PE\",10");
        assert_eq!(lines[2], "OS-2,,2.5");
    }

    #[test]
    fn test_json_export() {
        let mut buf = Vec::new();
        let count = export_json(&make_table(), &mut buf).unwrap();
        assert_eq!(count, 2);

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed[0]["Ordem"], "OS-1");
        assert_eq!(parsed[1]["Cidade"], serde_json::Value::Null);
        assert_eq!(parsed[1]["Valor"], 2.5);
    }

    #[test]
    fn test_xlsx_export_produces_zip_container() {
        let bytes = export_xlsx(&make_table()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("ods".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }
}
