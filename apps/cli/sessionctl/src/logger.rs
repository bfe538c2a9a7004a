//! Logging for `sessionctl`.
//!
//! Everything goes to the log file; stderr only gets warnings unless
//! `--verbose` is passed, so stdout carries nothing but command output.

use crate::error::CliError;

use std::io::stderr;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "sessionctl.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Level for the stderr output.
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose { LOG_LEVEL } else { LevelFilter::Warn }
}

/// Initialize file + stderr logging.
///
/// Safe to call multiple times; later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the global logger
/// cannot be installed.
pub fn initialize(log_dir: &Path, verbose: bool) -> Result<(), CliError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, console_level(verbose));
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{LOG_LEVEL:?}");
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path, console_level: LevelFilter) -> Result<(), CliError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = Dispatch::new().level(LOG_LEVEL);

    let stderr_dispatch = Dispatch::new()
        .level(console_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message}",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
            ))
        })
        .chain(stderr());

    // Plain text, no colors
    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(
            fern::log_file(&log_file_path)
                .map_err(|e| CliError::sessionctl(format!("Failed to create log file: {e}")))?,
        );

    base_dispatch
        .chain(stderr_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| CliError::sessionctl(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}
