// SheetTriage - util/logging.rs
//
// tracing subscriber setup for the CLI.
//
// The level comes from the first of: RUST_LOG, --debug, the [logging] level
// in config.toml, then "info". Everything goes to stderr; stdout carries
// only the run summary. Spreadsheet cell values appear at TRACE only.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), debug_flag, config_level);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&directive))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        filter = %directive,
        "Logging initialised"
    );
}

/// The filter directive chosen from the three level sources.
fn filter_directive(
    rust_log: Option<String>,
    debug_flag: bool,
    config_level: Option<&str>,
) -> String {
    match (rust_log, debug_flag, config_level) {
        (Some(env), _, _) if !env.trim().is_empty() => env,
        (_, true, _) => "debug".to_string(),
        (_, false, Some(level)) => level.to_string(),
        _ => super::constants::DEFAULT_LOG_LEVEL.to_string(),
    }
}
