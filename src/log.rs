//! The `log` module provides initialisation and configuration of the application's logging system.
//!
//! This module sets up logging with various levels (error, warn, info, debug, trace) and optional
//! colourisation based on terminal support. It also allows configuration of the log level through
//! environment variables.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::io::IsTerminal;
use std::sync::OnceLock;

/// A flag indicating whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The environment variable used to override the log level
const LOG_LEVEL_ENV_VAR: &str = "OFFSET_PLANNER_LOG_LEVEL";

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the
/// `OFFSET_PLANNER_LOG_LEVEL` environment variable or the settings.toml file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Convert a log level string into a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Initialise the program logger using the `fern` logging library with colourised output.
///
/// The user can specify their preferred logging level via the `settings.toml` file (defaulting to
/// `info` if not present) or with the `OFFSET_PLANNER_LOG_LEVEL` environment variable. If both are
/// provided, the environment variable takes precedence.
///
/// Possible log level options are:
///
/// * `off`
/// * `error`
/// * `warn`
/// * `info`
/// * `debug`
/// * `trace`
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
pub fn init(log_level_from_settings: Option<&str>) -> Result<()> {
    // Retrieve the log level from the environment variable or settings, or use the default
    let log_level = env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| {
        log_level_from_settings
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    });
    let log_level = parse_log_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Info and below go to stdout; warnings and errors go to stderr
    let stdout = stream_dispatch(log_level, colours, std::io::stdout().is_terminal())
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .chain(std::io::stdout());
    let stderr = stream_dispatch(
        log_level.min(LevelFilter::Warn),
        colours,
        std::io::stderr().is_terminal(),
    )
    .chain(std::io::stderr());

    if Dispatch::new().chain(stdout).chain(stderr).apply().is_err() {
        bail!("Logger already initialised");
    }
    let _ = LOGGER_INIT.set(());

    Ok(())
}

/// A dispatcher for one output stream, colouring the level only if `use_colour` is set
fn stream_dispatch(level: LevelFilter, colours: ColoredLevelConfig, use_colour: bool) -> Dispatch {
    Dispatch::new()
        .format(move |out, message, record| {
            if use_colour {
                write_record(out, colours.color(record.level()), record, message);
            } else {
                write_record(out, record.level(), record, message);
            }
        })
        .level(level)
}

/// Write a log line as `[time level target] message`
fn write_record<T: Display>(out: FormatCallback, level: T, record: &Record, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!(
        "[{timestamp} {level} {}] {message}",
        record.target()
    ));
}
