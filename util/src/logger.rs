//! Session logging for the digital twin
//!
//! Every line is stamped with the seconds elapsed since the session epoch and a coloured level tag,
//! and is written both to stdout and to the session's log file. Debug and trace lines also carry
//! their target module so per-tick output from the twin library can be traced back.
//!
//! The executor, rover and planner modules log every tick or expanded node at trace level. Those
//! targets are capped at debug so robustness runs over many trials stay readable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which log per tick or per node and are capped at [`LevelFilter::Debug`].
pub const PER_TICK_TARGETS: [&str; 3] = [
    "twin_lib::cmd_exec",
    "twin_lib::loco_ctrl",
    "twin_lib::nav",
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The twin must log at least at `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Could not install the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging to stdout and the session's log file.
///
/// `min_level` must include `INFO`, since simulation milestones and the final outcome are reported
/// at that level. Only the executable calls this, and only once.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                target_prefix(record),
                message
            ))
        })
        .level(min_level);

    for target in PER_TICK_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, min_level.min(LevelFilter::Debug));
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Twin logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Level: {:?}, per tick modules capped at Debug", min_level);
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Three letter coloured tag for a level.
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

/// `"<target>: "` for debug and trace records, empty otherwise.
fn target_prefix(record: &Record) -> String {
    if record.level() > log::Level::Info {
        format!("{}: ", record.target())
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_target_prefix() {
        let debug = Record::builder()
            .level(log::Level::Debug)
            .target("twin_lib::nav")
            .build();
        assert_eq!(target_prefix(&debug), "twin_lib::nav: ");

        let info = Record::builder()
            .level(log::Level::Info)
            .target("twin_lib::sim")
            .build();
        assert_eq!(target_prefix(&info), "");
    }

    #[test]
    fn test_level_tag() {
        colored::control::set_override(false);
        assert_eq!(level_tag(log::Level::Warn).to_string(), "WRN");
        assert_eq!(level_tag(log::Level::Error).to_string(), "ERR");
    }
}
