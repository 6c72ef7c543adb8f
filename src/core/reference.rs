// SheetTriage - core/reference.rs
//
// Parsing of the two reference lists (allowed localities, team/service
// descriptions) from CSV text into normalised sets.
// Core layer: pure logic. Fetching lives in app::fetch.

use crate::core::model::{ReferenceSet, TeamReferences};
use crate::util::constants;
use crate::util::error::FetchError;
use std::str::FromStr;

/// What to do when a reference list cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Warn and continue with an empty set (the filter is not applied).
    #[default]
    Degrade,
    /// Abort the run.
    Fail,
}

impl FromStr for FetchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(FetchFailurePolicy::Degrade),
            "fail" => Ok(FetchFailurePolicy::Fail),
            other => Err(format!(
                "unknown fetch failure policy '{other}'. Expected \"degrade\" or \"fail\""
            )),
        }
    }
}

/// A CSV document split into trimmed headers and raw records.
struct CsvColumns {
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl CsvColumns {
    fn parse(text: &str, location: &str) -> Result<Self, FetchError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| FetchError::Csv {
                location: location.to_string(),
                source: e,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(FetchError::EmptySource {
                location: location.to_string(),
            });
        }

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FetchError::Csv {
                location: location.to_string(),
                source: e,
            })?;

        Ok(Self { headers, records })
    }

    fn column_set(&self, col: usize) -> ReferenceSet {
        ReferenceSet::from_values(self.records.iter().filter_map(|r| r.get(col)))
    }

    /// Column by header name, else the positional fallback if it exists.
    fn named_or_positional(&self, header: &str, fallback: usize) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h == header)
            .or_else(|| (fallback < self.headers.len()).then_some(fallback))
    }
}

/// Parse the localities list: the first column of the document.
pub fn parse_localities(text: &str, location: &str) -> Result<ReferenceSet, FetchError> {
    let doc = CsvColumns::parse(text, location)?;
    let set = doc.column_set(0);
    tracing::debug!(
        location,
        column = %doc.headers[0],
        values = set.len(),
        "Parsed locality reference list"
    );
    Ok(set)
}

/// Parse the team/service list.
///
/// Reconnection descriptions come from the `RELIGAÇÃO` column (or column 0),
/// inspection descriptions from `FISCALIZAÇÃO` (or column 1 when present).
pub fn parse_teams(text: &str, location: &str) -> Result<TeamReferences, FetchError> {
    let doc = CsvColumns::parse(text, location)?;

    let reconnection = doc
        .named_or_positional(constants::RECONNECTION_HEADER, 0)
        .map(|c| doc.column_set(c))
        .unwrap_or_default();
    let inspection = doc
        .named_or_positional(constants::INSPECTION_HEADER, 1)
        .map(|c| doc.column_set(c))
        .unwrap_or_default();

    tracing::debug!(
        location,
        reconnection = reconnection.len(),
        inspection = inspection.len(),
        "Parsed team reference list"
    );

    Ok(TeamReferences {
        reconnection,
        inspection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localities_use_first_column() {
        let csv = "CIDADE,UF\n São Paulo ,SP\ncampinas,SP\n,SP\nnan,SP\n";
        let set = parse_localities(csv, "test").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("SÃO PAULO"));
        assert!(set.contains("CAMPINAS"));
    }

    #[test]
    fn test_teams_by_header_name() {
        // Named columns win over position even when swapped.
        let csv = "FISCALIZAÇÃO,RELIGAÇÃO\nvistoria,religa normal\n,religa urgente\n";
        let teams = parse_teams(csv, "test").unwrap();
        assert!(teams.reconnection.contains("RELIGA NORMAL"));
        assert!(teams.reconnection.contains("RELIGA URGENTE"));
        assert_eq!(teams.inspection.len(), 1);
        assert!(teams.inspection.contains("VISTORIA"));
    }

    #[test]
    fn test_teams_positional_fallback() {
        let csv = "A,B\nreliga,fiscaliza\n";
        let teams = parse_teams(csv, "test").unwrap();
        assert!(teams.reconnection.contains("RELIGA"));
        assert!(teams.inspection.contains("FISCALIZA"));
    }

    #[test]
    fn test_teams_single_column_has_no_inspection() {
        let csv = "A\nreliga\n";
        let teams = parse_teams(csv, "test").unwrap();
        assert_eq!(teams.reconnection.len(), 1);
        assert!(teams.inspection.is_empty());
    }

    #[test]
    fn test_bom_is_ignored() {
        let csv = "\u{feff}RELIGAÇÃO\nreliga\n";
        let teams = parse_teams(csv, "test").unwrap();
        assert!(teams.reconnection.contains("RELIGA"));
    }

    #[test]
    fn test_empty_document_is_an_error() {
        assert!(matches!(
            parse_localities("", "empty.csv"),
            Err(FetchError::EmptySource { .. })
        ));
    }
}
