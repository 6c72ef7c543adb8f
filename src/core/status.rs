// SheetTriage - core/status.rs
//
// Status filter: keeps rows whose status text contains any selected keyword.
// Core layer: pure logic, no I/O.

use crate::core::model::{ColumnSchema, StatusKeyword, Table};
use crate::util::error::{FilterError, Result, SchemaError};
use regex::{Regex, RegexBuilder};

/// Compile the case-insensitive alternation for the selected statuses.
pub fn status_pattern(statuses: &[StatusKeyword]) -> std::result::Result<Regex, FilterError> {
    let pattern = statuses
        .iter()
        .map(|s| regex::escape(s.label()))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::InvalidRegex { pattern, source: e })
}

/// Filter `table` by status.
///
/// Returns `Ok(None)` when there is nothing to show: the table is empty or no
/// status is selected. Empty status cells never match.
pub fn filter_by_status(
    table: &Table,
    statuses: &[StatusKeyword],
    schema: &ColumnSchema,
) -> Result<Option<Table>> {
    if table.is_empty() || statuses.is_empty() {
        return Ok(None);
    }

    let col = schema.status_column;
    if col >= table.column_count() {
        if schema.strict {
            return Err(SchemaError::MissingColumn {
                role: "status",
                position: col,
                available: table.column_count(),
            }
            .into());
        }
        tracing::warn!(
            column = col,
            available = table.column_count(),
            "Status column missing; status filter skipped"
        );
        return Ok(Some(table.clone()));
    }

    let regex = status_pattern(statuses)?;
    let filtered = table.retain_rows(|row| {
        row.get(col)
            .map(|cell| !cell.is_empty() && regex.is_match(&cell.as_text()))
            .unwrap_or(false)
    });

    tracing::info!(
        statuses = ?statuses,
        rows_in = table.row_count(),
        rows_out = filtered.row_count(),
        "Status filter done"
    );
    Ok(Some(filtered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Cell;
    use crate::util::error::TriageError;

    fn make_table(statuses: &[Cell]) -> Table {
        let headers = (0..22).map(|i| format!("col{i}")).collect();
        let rows = statuses
            .iter()
            .map(|s| {
                let mut row = vec![Cell::Empty; 22];
                row[21] = s.clone();
                row
            })
            .collect();
        Table::new(headers, rows)
    }

    #[test]
    fn test_substring_case_insensitive_match() {
        let table = make_table(&[
            Cell::text("PENDENTE - aguardando"),
            Cell::text("Concluído"),
            Cell::text("Ordem postergada"),
            Cell::Empty,
        ]);
        let out = filter_by_status(
            &table,
            &[StatusKeyword::Pending, StatusKeyword::Deferred],
            &ColumnSchema::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.cell(1, 21), &Cell::text("Ordem postergada"));
    }

    #[test]
    fn test_no_selection_is_empty_signal() {
        let table = make_table(&[Cell::text("Pendente")]);
        let out = filter_by_status(&table, &[], &ColumnSchema::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_empty_table_is_empty_signal() {
        let table = make_table(&[]);
        let out =
            filter_by_status(&table, StatusKeyword::all(), &ColumnSchema::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_narrow_table_strict_vs_lenient() {
        let table = Table::new(vec!["a".to_string()], vec![vec![Cell::text("Pendente")]]);
        let strict = filter_by_status(&table, StatusKeyword::all(), &ColumnSchema::default());
        assert!(matches!(strict, Err(TriageError::Schema(_))));

        let lenient =
            filter_by_status(&table, StatusKeyword::all(), &ColumnSchema::lenient()).unwrap();
        assert_eq!(lenient.unwrap().row_count(), 1);
    }

    #[test]
    fn test_pattern_matches_every_keyword() {
        let regex = status_pattern(StatusKeyword::all()).unwrap();
        for keyword in StatusKeyword::all() {
            assert!(regex.is_match(&keyword.label().to_uppercase()));
        }
        assert!(!regex.is_match("Cancelado"));
    }
}
