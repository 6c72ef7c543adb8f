// SheetTriage - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::export::ExportFormat;
use crate::core::reference::FetchFailurePolicy;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for SheetTriage configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/sheettriage/ or %APPDATA%\SheetTriage\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[references]` section.
    pub references: ReferencesSection,
    /// `[schema]` section.
    pub schema: SchemaSection,
    /// `[export]` section.
    pub export: ExportSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[references]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReferencesSection {
    /// URL or path of the localities CSV.
    pub localities: Option<String>,
    /// URL or path of the teams CSV.
    pub teams: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// "degrade" or "fail".
    pub on_fetch_error: Option<String>,
}

/// `[schema]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SchemaSection {
    /// Fail on missing columns instead of degrading.
    pub strict: Option<bool>,
    /// Pin the team/service column instead of auto-detecting it.
    pub team_column: Option<usize>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// "xlsx", "csv" or "json".
    pub format: Option<String>,
    /// Directory receiving the exported files.
    pub output_dir: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- References --
    pub localities_source: String,
    pub teams_source: String,
    pub fetch_timeout_secs: u64,
    pub fetch_policy: FetchFailurePolicy,

    // -- Schema --
    pub strict_schema: bool,
    pub team_column: Option<usize>,

    // -- Export --
    pub export_format: ExportFormat,
    pub output_dir: PathBuf,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            localities_source: constants::DEFAULT_LOCALITIES_SOURCE.to_string(),
            teams_source: constants::DEFAULT_TEAMS_SOURCE.to_string(),
            fetch_timeout_secs: constants::DEFAULT_FETCH_TIMEOUT_SECS,
            fetch_policy: FetchFailurePolicy::Degrade,
            strict_schema: true,
            team_column: None,
            export_format: ExportFormat::Xlsx,
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            log_level: None,
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings; an unreadable or
/// unparseable one yields defaults with a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    match toml::from_str::<RawConfig>(&content) {
        Ok(raw) => {
            tracing::info!(path = %config_path.display(), "Loaded config.toml");
            let config = validate(raw, &mut warnings);
            (config, warnings)
        }
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            (AppConfig::default(), warnings)
        }
    }
}

/// Load a config file the user named explicitly (`--config`).
///
/// Unlike [`load_config`], a missing or malformed file is an error.
pub fn load_explicit_config(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %config_path.display(), "Loaded config file");
    let mut warnings = Vec::new();
    let config = validate(raw, &mut warnings);
    Ok((config, warnings))
}

/// Validate each field against named constants, accumulating all problems.
pub fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- References: sources --
    if let Some(source) = raw.references.localities.filter(|s| !s.trim().is_empty()) {
        config.localities_source = source;
    }
    if let Some(source) = raw.references.teams.filter(|s| !s.trim().is_empty()) {
        config.teams_source = source;
    }

    // -- References: timeout_seconds --
    if let Some(secs) = raw.references.timeout_seconds {
        if (constants::MIN_FETCH_TIMEOUT_SECS..=constants::MAX_FETCH_TIMEOUT_SECS).contains(&secs) {
            config.fetch_timeout_secs = secs;
        } else {
            warnings.push(format!(
                "[references] timeout_seconds = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_FETCH_TIMEOUT_SECS,
                constants::MAX_FETCH_TIMEOUT_SECS,
                constants::DEFAULT_FETCH_TIMEOUT_SECS,
            ));
        }
    }

    // -- References: on_fetch_error --
    if let Some(ref policy) = raw.references.on_fetch_error {
        match policy.parse::<FetchFailurePolicy>() {
            Ok(p) => config.fetch_policy = p,
            Err(e) => warnings.push(format!(
                "[references] on_fetch_error: {e}. Using default (degrade)."
            )),
        }
    }

    // -- Schema --
    if let Some(strict) = raw.schema.strict {
        config.strict_schema = strict;
    }
    if let Some(col) = raw.schema.team_column {
        if col <= constants::MAX_TEAM_COLUMN {
            config.team_column = Some(col);
        } else {
            warnings.push(format!(
                "[schema] team_column = {col} is out of range (0-{}). Using auto-detection.",
                constants::MAX_TEAM_COLUMN,
            ));
        }
    }

    // -- Export --
    if let Some(ref format) = raw.export.format {
        match format.parse::<ExportFormat>() {
            Ok(f) => config.export_format = f,
            Err(e) => warnings.push(format!("[export] format: {e}. Using default (xlsx).")),
        }
    }
    if let Some(dir) = raw.export.output_dir.filter(|d| !d.trim().is_empty()) {
        config.output_dir = PathBuf::from(dir);
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (AppConfig, Vec<String>) {
        let raw: RawConfig = toml::from_str(text).unwrap();
        let mut warnings = Vec::new();
        let config = validate(raw, &mut warnings);
        (config, warnings)
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let (config, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(config.localities_source, constants::DEFAULT_LOCALITIES_SOURCE);
        assert_eq!(config.fetch_policy, FetchFailurePolicy::Degrade);
        assert!(config.strict_schema);
        assert_eq!(config.export_format, ExportFormat::Xlsx);
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = parse(
            r#"
            [references]
            localities = "refs/cidades.csv"
            timeout_seconds = 5
            on_fetch_error = "fail"

            [schema]
            strict = false
            team_column = 9

            [export]
            format = "csv"
            output_dir = "saida"

            [logging]
            level = "DEBUG"
            "#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.localities_source, "refs/cidades.csv");
        assert_eq!(config.teams_source, constants::DEFAULT_TEAMS_SOURCE);
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.fetch_policy, FetchFailurePolicy::Fail);
        assert!(!config.strict_schema);
        assert_eq!(config.team_column, Some(9));
        assert_eq!(config.export_format, ExportFormat::Csv);
        assert_eq!(config.output_dir, PathBuf::from("saida"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let (config, warnings) = parse(
            r#"
            [references]
            timeout_seconds = 0
            on_fetch_error = "retry"

            [schema]
            team_column = 9000

            [export]
            format = "ods"

            [logging]
            level = "loud"
            "#,
        );
        assert_eq!(warnings.len(), 5);
        assert_eq!(config.fetch_timeout_secs, constants::DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.fetch_policy, FetchFailurePolicy::Degrade);
        assert_eq!(config.team_column, None);
        assert_eq!(config.export_format, ExportFormat::Xlsx);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let (_, warnings) = load_config(&dir.path().join("config.toml"));
        assert!(warnings.is_empty());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[references\nlocalities = ").unwrap();
        let (config, warnings) = load_config(&broken);
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.teams_source, constants::DEFAULT_TEAMS_SOURCE);
    }

    #[test]
    fn test_explicit_config_errors_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_explicit_config(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[export\n").unwrap();
        assert!(matches!(
            load_explicit_config(&broken),
            Err(ConfigError::TomlParse { .. })
        ));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[export]\nformat = \"json\"\n").unwrap();
        let (config, warnings) = load_explicit_config(&good).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.export_format, ExportFormat::Json);
    }
}
