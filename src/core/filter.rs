// SheetTriage - core/filter.rs
//
// Row filter: keeps rows whose locality is an allowed locality and whose
// team/service description is a recognised one. Both steps are AND-combined
// and each is skipped when its reference set is empty.
// Core layer: pure logic, no I/O.

use crate::core::model::{ColumnSchema, ReferenceSet, References, Table};
use crate::util::error::SchemaError;

/// Result of one row-filter pass with per-step diagnostics.
#[derive(Debug, Clone)]
pub struct RowFilterOutcome {
    /// Rows that survived both steps.
    pub table: Table,

    /// Row count of the input table.
    pub rows_in: usize,

    /// Row count after the locality step.
    pub rows_after_locality: usize,

    /// Whether the locality step actually filtered.
    pub locality_applied: bool,

    /// Column used for the team step, if any.
    pub team_column: Option<usize>,
}

/// Apply the locality step then the team/service step.
pub fn filter_rows(
    table: &Table,
    references: &References,
    schema: &ColumnSchema,
) -> Result<RowFilterOutcome, SchemaError> {
    let rows_in = table.row_count();

    let (by_locality, locality_applied) =
        filter_by_locality(table, &references.localities, schema)?;
    let rows_after_locality = by_locality.row_count();
    tracing::info!(
        rows_in,
        rows_after_locality,
        applied = locality_applied,
        "Locality filter done"
    );

    let union = references.teams.union();
    let team_column = if union.is_empty() {
        tracing::info!("Team reference list is empty; team filter skipped");
        None
    } else {
        match schema.team_column {
            Some(col) => {
                schema.require("team", col, &by_locality)?;
                Some(col)
            }
            None => detect_team_column(&by_locality, &union),
        }
    };

    let table = match team_column {
        Some(col) => {
            tracing::info!(
                column = col,
                header = by_locality.headers().get(col).map(String::as_str).unwrap_or(""),
                "Team column selected"
            );
            by_locality.retain_rows(|row| {
                row.get(col)
                    .map(|cell| union.contains_cell(cell))
                    .unwrap_or(false)
            })
        }
        None => by_locality,
    };

    tracing::info!(rows_out = table.row_count(), "Team filter done");

    Ok(RowFilterOutcome {
        table,
        rows_in,
        rows_after_locality,
        locality_applied,
        team_column,
    })
}

/// Keep rows whose locality cell is in `localities`.
///
/// Returns the table unchanged (and `false`) when the set is empty, or when
/// the locality column is missing and the schema is lenient.
pub fn filter_by_locality(
    table: &Table,
    localities: &ReferenceSet,
    schema: &ColumnSchema,
) -> Result<(Table, bool), SchemaError> {
    if localities.is_empty() {
        tracing::info!("Locality reference list is empty; locality filter skipped");
        return Ok((table.clone(), false));
    }

    let col = schema.locality_column;
    if col >= table.column_count() {
        if schema.strict {
            return Err(SchemaError::MissingColumn {
                role: "locality",
                position: col,
                available: table.column_count(),
            });
        }
        tracing::warn!(
            column = col,
            available = table.column_count(),
            "Locality column missing; locality filter skipped"
        );
        return Ok((table.clone(), false));
    }

    let filtered = table.retain_rows(|row| {
        row.get(col)
            .map(|cell| localities.contains_cell(cell))
            .unwrap_or(false)
    });
    Ok((filtered, true))
}

/// First column (left to right) whose normalised values intersect `union`.
///
/// Partial overlap is enough: a single matching value selects the column.
pub fn detect_team_column(table: &Table, union: &ReferenceSet) -> Option<usize> {
    (0..table.column_count()).find(|&col| table.column(col).any(|cell| union.contains_cell(cell)))
}
