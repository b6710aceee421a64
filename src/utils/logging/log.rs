//! Logging helpers
//!
//! Loader operations log through these so that every source reports its
//! progress and row counts in the same format.

use std::path::Path;
use std::time::Duration;

use crate::loader::LoadSummary;

/// Install `env_logger`, honouring `RUST_LOG` and defaulting to `info`
///
/// Calling it more than once is harmless; only the first call installs a logger.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Log the start of an operation on a path
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log the completion of an operation on a path
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. "read"
/// * `path` - File or directory that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    path: &Path,
    items: usize,
    elapsed: Option<Duration>,
) {
    match elapsed {
        Some(duration) => log::info!(
            "Successfully {operation} {items} items from {} in {duration:?}",
            path.display()
        ),
        None => log::info!("Successfully {operation} {items} items from {}", path.display()),
    }
}

/// Log the row counts of a finished load
///
/// Skipped rows are reported as a warning, everything else at debug level.
pub fn log_load_summary(summary: &LoadSummary, source: &Path) {
    if summary.skipped > 0 {
        log::warn!(
            "Skipped {} malformed rows of {} in {}",
            summary.skipped,
            summary.rows_read,
            source.display()
        );
    }
    log::debug!(
        "{}: {} rows read, {} records loaded",
        source.display(),
        summary.rows_read,
        summary.loaded
    );
}

pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
