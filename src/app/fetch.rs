// SheetTriage - app/fetch.rs
//
// Loads both reference lists for one processing pass.
// Sources are fetched every pass (no cache). A source is either an
// http(s) URL or a local CSV path. Failures follow the configured
// FetchFailurePolicy: degrade to an empty set with a warning, or abort.

use crate::core::model::{ReferenceSet, References, TeamReferences};
use crate::core::reference::{self, FetchFailurePolicy};
use crate::util::error::FetchError;
use reqwest::blocking::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where a reference list lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLocation {
    Url(String),
    Path(PathBuf),
}

impl ReferenceLocation {
    /// `http://` and `https://` are URLs; anything else is a file path.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ReferenceLocation::Url(trimmed.to_string())
        } else {
            ReferenceLocation::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for ReferenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceLocation::Url(url) => f.write_str(url),
            ReferenceLocation::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch settings shared by both sources.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub policy: FetchFailurePolicy,
}

/// Fetches reference CSV documents over HTTP or from disk.
pub struct ReferenceFetcher {
    client: Client,
    policy: FetchFailurePolicy,
}

impl ReferenceFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| FetchError::Http {
                url: String::from("<client>"),
                source: e,
            })?;
        Ok(Self {
            client,
            policy: options.policy,
        })
    }

    /// Raw text of the document at `location`.
    pub fn fetch_text(&self, location: &ReferenceLocation) -> Result<String, FetchError> {
        match location {
            ReferenceLocation::Url(url) => {
                tracing::debug!(url = %url, "Fetching reference list");
                let response = self.client.get(url).send().map_err(|e| FetchError::Http {
                    url: url.clone(),
                    source: e,
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                response.text().map_err(|e| FetchError::Http {
                    url: url.clone(),
                    source: e,
                })
            }
            ReferenceLocation::Path(path) => {
                tracing::debug!(path = %path.display(), "Reading reference list");
                let bytes = std::fs::read(path).map_err(|e| FetchError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                Ok(decode_text(bytes, location))
            }
        }
    }

    /// Load the allowed-localities set.
    pub fn localities(&self, location: &ReferenceLocation) -> Result<ReferenceSet, FetchError> {
        let text = self.fetch_text(location)?;
        reference::parse_localities(&text, &location.to_string())
    }

    /// Load the team/service sets.
    pub fn teams(&self, location: &ReferenceLocation) -> Result<TeamReferences, FetchError> {
        let text = self.fetch_text(location)?;
        reference::parse_teams(&text, &location.to_string())
    }

    /// Load both lists, applying the failure policy to each independently.
    pub fn load(
        &self,
        localities: &ReferenceLocation,
        teams: &ReferenceLocation,
    ) -> Result<References, FetchError> {
        let mut warnings = Vec::new();

        let localities =
            self.degrade_or_fail(self.localities(localities), "localities", &mut warnings)?;
        let teams = self.degrade_or_fail(self.teams(teams), "teams", &mut warnings)?;

        tracing::info!(
            localities = localities.len(),
            reconnection = teams.reconnection.len(),
            inspection = teams.inspection.len(),
            "Reference lists loaded"
        );

        Ok(References {
            localities,
            teams,
            warnings,
        })
    }

    fn degrade_or_fail<T: Default>(
        &self,
        result: Result<T, FetchError>,
        list: &'static str,
        warnings: &mut Vec<String>,
    ) -> Result<T, FetchError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => match self.policy {
                FetchFailurePolicy::Fail => Err(e),
                FetchFailurePolicy::Degrade => {
                    tracing::warn!(
                        list,
                        error = %e,
                        "Reference list unavailable; its filter is disabled"
                    );
                    warnings.push(format!(
                        "Could not load {list} reference list ({e}); {list} filter not applied."
                    ));
                    Ok(T::default())
                }
            },
        }
    }
}

/// UTF-8 text of a local file; invalid bytes become U+FFFD.
fn decode_text(bytes: Vec<u8>, location: &ReferenceLocation) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                source = %location,
                valid_up_to = e.utf8_error().valid_up_to(),
                "Reference list is not valid UTF-8; invalid bytes replaced"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
