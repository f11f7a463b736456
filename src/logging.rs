use crate::error::{Result, ScraperError};
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "open_data_scraper";
/// Daily files kept before the oldest is removed
const MAX_LOG_FILES: usize = 14;
const DEFAULT_DIRECTIVES: &str = "open_data_scraper=info,warn";

/// Filter from `RUST_LOG`, or the crate at info and everything else at warn.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber: JSON lines into `logs/open_data_scraper.<date>.log`
/// and readable output on stderr, keeping stdout for run summaries.
pub fn init_logging() -> Result<()> {
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(LOG_DIR)
        .map_err(|e| ScraperError::Config(format!("Cannot open log directory '{LOG_DIR}': {e}")))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref()))
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ScraperError::Config(format!("Logging already initialised: {e}")))?;

    // flushes on drop, so it has to live as long as the process
    std::mem::forget(guard);
    Ok(())
}
