// SheetTriage - app/pipeline.rs
//
// Turns a loaded session into exported files: slices the view by category
// and service, writes one file per slice and builds the run summary.

use crate::app::state::Session;
use crate::core::export::{self, ExportFormat};
use crate::core::model::{ServiceCategory, StatusKeyword, Table};
use crate::core::view::{ViewColumn, ViewTable};
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{Result, TriageError};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a slice holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceKind {
    /// Rows of one category sharing one service value.
    Service(ServiceCategory),
    /// All rows of one category.
    Category(ServiceCategory),
    /// Every status-filtered row.
    AllRecords,
    /// The processed table before the status filter, all original columns.
    Processed,
}

/// One exportable subset of the data.
#[derive(Debug, Clone)]
pub struct Slice {
    pub kind: SliceKind,
    /// File-name stem before sanitising and timestamping.
    pub stem: String,
    pub table: Table,
}

/// Build every slice for a view (if any) plus the processed table.
///
/// Per category with rows: one slice per distinct service in first-seen
/// order, then the whole category. Then all records, then the processed
/// table, which is produced even when the view is empty.
pub fn build_slices(view: Option<&ViewTable>, processed: &Table) -> Vec<Slice> {
    let mut slices = Vec::new();

    if let Some(view) = view {
        for &category in ServiceCategory::all() {
            let rows = view.category(category);
            if rows.is_empty() {
                continue;
            }
            slices.extend(service_slices(&rows, category));
            slices.push(Slice {
                kind: SliceKind::Category(category),
                stem: category.label().to_string(),
                table: rows,
            });
        }
        slices.push(Slice {
            kind: SliceKind::AllRecords,
            stem: constants::ALL_RECORDS_STEM.to_string(),
            table: view.all_rows(),
        });
    }

    slices.push(Slice {
        kind: SliceKind::Processed,
        stem: constants::PROCESSED_STEM.to_string(),
        table: processed.clone(),
    });
    slices
}

fn service_slices(rows: &Table, category: ServiceCategory) -> Vec<Slice> {
    let Some(col) = rows.column_index(ViewColumn::Service.header()) else {
        return Vec::new();
    };

    let mut services: Vec<String> = Vec::new();
    for cell in rows.column(col) {
        let service = cell.as_text();
        if !services.contains(&service) {
            services.push(service);
        }
    }

    services
        .into_iter()
        .map(|service| {
            let table = rows.retain_rows(|row| {
                row.get(col).map(|c| c.as_text()).unwrap_or_default() == service
            });
            Slice {
                kind: SliceKind::Service(category),
                stem: service,
                table,
            }
        })
        .collect()
}

/// `<stem>_<YYYYmmdd_HHMMSS>.<ext>` with the stem made file-system safe.
pub fn file_name(stem: &str, timestamp: NaiveDateTime, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        fs::sanitize_file_stem(stem),
        timestamp.format(constants::EXPORT_TIMESTAMP_FORMAT),
        format.extension()
    )
}

/// Write each slice into `dir`, returning the written paths in slice order.
///
/// Stems that collide after sanitising get a numeric suffix.
pub fn write_slices(
    slices: &[Slice],
    dir: &Path,
    format: ExportFormat,
    timestamp: NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| TriageError::Io {
        path: dir.to_path_buf(),
        operation: "create output directory",
        source: e,
    })?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(slices.len());

    for slice in slices {
        let mut name = file_name(&slice.stem, timestamp, format);
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = file_name(&format!("{}_{n}", slice.stem), timestamp, format);
            n += 1;
        }

        let path = dir.join(&name);
        let bytes = export::export_table(&slice.table, format)?;
        fs::write_atomic(&path, &bytes)?;
        tracing::info!(
            path = %path.display(),
            kind = ?slice.kind,
            rows = slice.table.row_count(),
            "Slice exported"
        );
        written.push(path);
    }

    Ok(written)
}

/// Counts and outcomes of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub input: PathBuf,
    pub rows_read: usize,
    pub rows_after_locality: usize,
    pub locality_applied: bool,
    pub team_column: Option<usize>,
    pub rows_processed: usize,
    /// None when no status was selected or the processed table is empty.
    pub rows_after_status: Option<usize>,
    pub category_counts: Vec<(ServiceCategory, usize)>,
    pub written: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input: {}", self.input.display())?;
        writeln!(f, "Rows read: {}", self.rows_read)?;
        if self.locality_applied {
            writeln!(f, "After locality filter: {}", self.rows_after_locality)?;
        } else {
            writeln!(f, "Locality filter: not applied")?;
        }
        match self.team_column {
            Some(col) => writeln!(
                f,
                "After team filter (column {col}): {}",
                self.rows_processed
            )?,
            None => writeln!(f, "Team filter: not applied")?,
        }
        match self.rows_after_status {
            Some(rows) => writeln!(f, "After status filter: {rows}")?,
            None => writeln!(f, "No records found for the selected statuses")?,
        }
        for (category, count) in &self.category_counts {
            writeln!(f, "  {category}: {count}")?;
        }
        writeln!(f, "Files written: {}", self.written.len())?;
        for path in &self.written {
            writeln!(f, "  {}", path.display())?;
        }
        for warning in &self.warnings {
            writeln!(f, "Warning: {warning}")?;
        }
        Ok(())
    }
}

/// Export options for one run.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    pub statuses: &'a [StatusKeyword],
    pub today: NaiveDate,
    pub format: ExportFormat,
    pub output_dir: &'a Path,
    pub timestamp: NaiveDateTime,
}

/// Slice and export a session, returning the run summary.
pub fn export_session(session: &Session, request: &ExportRequest<'_>) -> Result<RunSummary> {
    let filtered = session.filtered(request.statuses)?;
    let view = match &filtered {
        Some(table) => session.view_of(table, request.today)?,
        None => None,
    };
    let slices = build_slices(view.as_ref(), session.processed());
    let written = write_slices(
        &slices,
        request.output_dir,
        request.format,
        request.timestamp,
    )?;

    let outcome = &session.outcome;
    let summary = RunSummary {
        input: session.source.clone(),
        rows_read: outcome.rows_in,
        rows_after_locality: outcome.rows_after_locality,
        locality_applied: outcome.locality_applied,
        team_column: outcome.team_column,
        rows_processed: outcome.table.row_count(),
        rows_after_status: filtered.as_ref().map(Table::row_count),
        category_counts: view
            .as_ref()
            .map(|v| {
                ServiceCategory::all()
                    .iter()
                    .map(|&c| (c, v.count(c)))
                    .collect()
            })
            .unwrap_or_default(),
        written,
        warnings: session.references.warnings.clone(),
    };

    tracing::info!(
        rows_read = summary.rows_read,
        rows_processed = summary.rows_processed,
        rows_after_status = ?summary.rows_after_status,
        files = summary.written.len(),
        "Run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Cell, ColumnSchema, ReferenceSet, TeamReferences};
    use crate::core::view::prepare_view;

    fn make_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    fn make_row(service: &str) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 26];
        row[6] = Cell::text("SAO PAULO");
        row[9] = Cell::text(service);
        row[21] = Cell::text("Pendente");
        row
    }

    fn make_view(services: &[&str]) -> (ViewTable, Table) {
        let headers = (0..26).map(|i| format!("col{i}")).collect();
        let table = Table::new(headers, services.iter().map(|s| make_row(s)).collect());
        let teams = TeamReferences {
            reconnection: ReferenceSet::from_values(["RELIGA A", "RELIGA B"]),
            inspection: ReferenceSet::from_values(["FISCALIZA"]),
        };
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let view = prepare_view(&table, &teams, &ColumnSchema::default(), today)
            .unwrap()
            .unwrap();
        (view, table)
    }

    #[test]
    fn test_slice_order_and_stems() {
        let (view, processed) = make_view(&["RELIGA B", "FISCALIZA", "RELIGA A", "RELIGA B"]);
        let slices = build_slices(Some(&view), &processed);
        let stems: Vec<&str> = slices.iter().map(|s| s.stem.as_str()).collect();
        assert_eq!(
            stems,
            vec![
                "RELIGA B",
                "RELIGA A",
                "RELIGAÇÃO",
                "FISCALIZA",
                "FISCALIZAÇÃO",
                "todos_registros",
                "processado_completo",
            ]
        );
        assert_eq!(slices[0].table.row_count(), 2);
        assert_eq!(slices[2].table.row_count(), 3);
        assert_eq!(slices[5].table.row_count(), 4);
        assert_eq!(slices[6].table.column_count(), 26);
    }

    #[test]
    fn test_empty_view_still_exports_processed() {
        let processed = Table::new(vec!["a".to_string()], vec![vec![Cell::text("x")]]);
        let slices = build_slices(None, &processed);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].kind, SliceKind::Processed);
    }

    #[test]
    fn test_category_slices_omit_category_column() {
        let (view, processed) = make_view(&["desconhecido"]);
        let slices = build_slices(Some(&view), &processed);
        assert_eq!(slices[0].kind, SliceKind::Service(ServiceCategory::Undefined));
        assert_eq!(slices[1].stem, "INDEFINIDO");
        for slice in &slices[..3] {
            assert!(slice.table.column_index("Tipo_Equipe").is_none());
        }
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(
            file_name("CORTE/RELIGA", make_timestamp(), ExportFormat::Csv),
            "CORTE_RELIGA_20240201_093005.csv"
        );
    }

    #[test]
    fn test_write_slices_disambiguates_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("saida");
        let table = Table::new(vec!["a".to_string()], vec![vec![Cell::text("x")]]);
        let slices = vec![
            Slice {
                kind: SliceKind::Service(ServiceCategory::Undefined),
                stem: "A/B".to_string(),
                table: table.clone(),
            },
            Slice {
                kind: SliceKind::Service(ServiceCategory::Undefined),
                stem: "A:B".to_string(),
                table,
            },
        ];
        let written = write_slices(&slices, &out, ExportFormat::Json, make_timestamp()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("A_B_20240201_093005.json"));
        assert!(written[1].ends_with("A_B_2_20240201_093005.json"));
        assert!(written.iter().all(|p| p.exists()));
    }
}
