// SheetTriage - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Reference loading, workbook processing and slice export
// 4. Printing the run summary to stdout

use sheettriage::app::fetch::{FetchOptions, ReferenceFetcher, ReferenceLocation};
use sheettriage::app::pipeline::{self, ExportRequest, RunSummary};
use sheettriage::app::state::AppState;
use sheettriage::core::export::ExportFormat;
use sheettriage::core::model::{ColumnSchema, StatusKeyword};
use sheettriage::core::reference::FetchFailurePolicy;
use sheettriage::platform::config::{self, AppConfig, PlatformPaths};
use sheettriage::util;
use sheettriage::util::error::TriageError;

use chrono::NaiveDate;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// SheetTriage - service-order spreadsheet triage.
///
/// Filters an uploaded work-order spreadsheet by allowed localities and
/// recognised services, then exports per-category and per-service files.
#[derive(Parser, Debug)]
#[command(name = "sheettriage", version, about)]
struct Cli {
    /// Spreadsheet to process (first sheet; first row is the header).
    input: PathBuf,

    /// Directory the exported files are written to.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Statuses to keep, comma separated (Pendente, Postergada, Programado).
    #[arg(short = 's', long = "status", value_delimiter = ',')]
    statuses: Vec<StatusKeyword>,

    /// Output format: xlsx, csv or json.
    #[arg(short = 'f', long = "format")]
    format: Option<ExportFormat>,

    /// Localities reference list (URL or CSV path).
    #[arg(long = "localities")]
    localities: Option<String>,

    /// Teams/services reference list (URL or CSV path).
    #[arg(long = "teams")]
    teams: Option<String>,

    /// Date used for the overdue computation, DD/MM/YYYY. Defaults to today.
    #[arg(long = "today", value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// Abort when a reference list cannot be loaded.
    #[arg(long = "strict-references")]
    strict_references: bool,

    /// Tolerate missing columns instead of failing.
    #[arg(long = "lenient-schema")]
    lenient_schema: bool,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn parse_today(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), util::constants::DEADLINE_FORMAT)
        .map_err(|e| format!("expected DD/MM/YYYY: {e}"))
}

fn main() {
    let cli = Cli::parse();

    // Config comes first so its logging level can seed the subscriber.
    let (config, config_warnings) = match &cli.config {
        Some(path) => match config::load_explicit_config(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                util::logging::init(cli.debug, None);
                fail(&TriageError::from(e));
            }
        },
        None => config::load_config(&PlatformPaths::resolve().config_file()),
    };

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "SheetTriage starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    match run(&cli, &config) {
        Ok(summary) => print!("{summary}"),
        Err(e) => fail(&e),
    }
}

fn run(cli: &Cli, config: &AppConfig) -> util::error::Result<RunSummary> {
    let options = FetchOptions {
        timeout: Duration::from_secs(config.fetch_timeout_secs),
        policy: if cli.strict_references {
            FetchFailurePolicy::Fail
        } else {
            config.fetch_policy
        },
    };
    let localities =
        ReferenceLocation::parse(cli.localities.as_deref().unwrap_or(&config.localities_source));
    let teams = ReferenceLocation::parse(cli.teams.as_deref().unwrap_or(&config.teams_source));

    let references = ReferenceFetcher::new(&options)?.load(&localities, &teams)?;

    let schema = ColumnSchema {
        team_column: config.team_column,
        strict: config.strict_schema && !cli.lenient_schema,
        ..ColumnSchema::default()
    };

    let mut state = AppState::new();
    let session = state.load(&cli.input, references, schema)?;

    let statuses: Vec<StatusKeyword> = if cli.statuses.is_empty() {
        StatusKeyword::all().to_vec()
    } else {
        cli.statuses.clone()
    };
    let output_dir = cli.output.clone().unwrap_or_else(|| config.output_dir.clone());
    let now = chrono::Local::now();

    let request = ExportRequest {
        statuses: &statuses,
        today: cli.today.unwrap_or_else(|| now.date_naive()),
        format: cli.format.unwrap_or(config.export_format),
        output_dir: &output_dir,
        timestamp: now.naive_local(),
    };
    pipeline::export_session(session, &request)
}

fn fail(error: &TriageError) -> ! {
    tracing::error!(error = %error, "Run failed");
    eprintln!("Error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    std::process::exit(1);
}
