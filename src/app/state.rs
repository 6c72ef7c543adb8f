// SheetTriage - app/state.rs
//
// Processing session state. A `Session` is the result of reading one
// workbook and applying the row filter against one set of references.
// `AppState` owns at most one session and swaps it wholesale on reload.

use crate::app::pipeline::{self, Slice};
use crate::core::filter::{self, RowFilterOutcome};
use crate::core::model::{ColumnSchema, References, StatusKeyword, Table};
use crate::core::status;
use crate::core::view::{self, ViewTable};
use crate::platform::workbook;
use crate::util::error::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// One processed upload.
#[derive(Debug, Clone)]
pub struct Session {
    /// Workbook the session was built from.
    pub source: PathBuf,

    /// Row-filter output and per-step counts.
    pub outcome: RowFilterOutcome,

    /// References the filter ran against.
    pub references: References,

    /// Column contract used for every step of this session.
    pub schema: ColumnSchema,
}

impl Session {
    /// Read `path` and apply the row filter.
    pub fn load(path: &Path, references: References, schema: ColumnSchema) -> Result<Self> {
        let table = workbook::read_workbook(path)?;
        let outcome = filter::filter_rows(&table, &references, &schema)?;
        tracing::info!(
            path = %path.display(),
            rows_in = outcome.rows_in,
            rows_out = outcome.table.row_count(),
            "Session loaded"
        );
        Ok(Self {
            source: path.to_path_buf(),
            outcome,
            references,
            schema,
        })
    }

    /// The full processed table (all original columns, no status filter).
    pub fn processed(&self) -> &Table {
        &self.outcome.table
    }

    /// Status-filtered table, or `None` when there is nothing to show.
    pub fn filtered(&self, statuses: &[StatusKeyword]) -> Result<Option<Table>> {
        status::filter_by_status(self.processed(), statuses, &self.schema)
    }

    /// Status filter followed by view preparation.
    pub fn view(&self, statuses: &[StatusKeyword], today: NaiveDate) -> Result<Option<ViewTable>> {
        match self.filtered(statuses)? {
            Some(filtered) => self.view_of(&filtered, today),
            None => Ok(None),
        }
    }

    /// Every exportable slice for the given status selection.
    pub fn slices(&self, statuses: &[StatusKeyword], today: NaiveDate) -> Result<Vec<Slice>> {
        let view = self.view(statuses, today)?;
        Ok(pipeline::build_slices(view.as_ref(), self.processed()))
    }

    /// View of an already status-filtered table.
    pub fn view_of(&self, filtered: &Table, today: NaiveDate) -> Result<Option<ViewTable>> {
        Ok(view::prepare_view(
            filtered,
            &self.references.teams,
            &self.schema,
            today,
        )?)
    }
}

/// Holder for the current session.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Session>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Load a new session, replacing the current one only on success.
    pub fn load(
        &mut self,
        path: &Path,
        references: References,
        schema: ColumnSchema,
    ) -> Result<&Session> {
        match Session::load(path, references, schema) {
            Ok(session) => Ok(&*self.session.insert(session)),
            Err(e) => {
                if self.session.is_some() {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Load failed; previous session kept"
                    );
                }
                Err(e)
            }
        }
    }

    /// Drop the current session.
    pub fn clear(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ReferenceSet;
    use rust_xlsxwriter::Workbook;

    fn make_workbook(path: &Path, localities: &[&str]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for col in 0..30u16 {
            sheet.write_string(0, col, format!("col{col}")).unwrap();
        }
        for (i, locality) in localities.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 1, format!("OS-{row}")).unwrap();
            sheet.write_string(row, 6, *locality).unwrap();
            sheet.write_string(row, 9, "RELIGA").unwrap();
            sheet.write_string(row, 21, "Pendente").unwrap();
        }
        workbook.save(path).unwrap();
    }

    fn make_references() -> References {
        References {
            localities: ReferenceSet::from_values(["SAO PAULO"]),
            ..References::default()
        }
    }

    #[test]
    fn test_session_load_filters_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");
        make_workbook(&path, &["SAO PAULO", "RIO"]);

        let session = Session::load(&path, make_references(), ColumnSchema::default()).unwrap();
        assert_eq!(session.outcome.rows_in, 2);
        assert_eq!(session.processed().row_count(), 1);
        assert_eq!(session.source, path);
    }

    #[test]
    fn test_failed_reload_keeps_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");
        make_workbook(&path, &["SAO PAULO"]);

        let mut state = AppState::new();
        state
            .load(&path, make_references(), ColumnSchema::default())
            .unwrap();

        let bad = dir.path().join("missing.xlsx");
        assert!(state
            .load(&bad, make_references(), ColumnSchema::default())
            .is_err());
        assert_eq!(state.session().unwrap().source, path);

        state.clear();
        assert!(state.session().is_none());
    }

    #[test]
    fn test_view_without_statuses_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");
        make_workbook(&path, &["SAO PAULO"]);

        let session = Session::load(&path, make_references(), ColumnSchema::default()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(session.view(&[], today).unwrap().is_none());
        let view = session
            .view(&[StatusKeyword::Pending], today)
            .unwrap()
            .unwrap();
        assert_eq!(view.table.row_count(), 1);

        let stems: Vec<String> = session
            .slices(&[StatusKeyword::Pending], today)
            .unwrap()
            .into_iter()
            .map(|s| s.stem)
            .collect();
        assert_eq!(
            stems,
            vec!["RELIGA", "INDEFINIDO", "todos_registros", "processado_completo"]
        );
    }
}
