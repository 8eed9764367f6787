use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use clap::ArgMatches;
use tracing::{debug, Level};

/// Levels reached by one to four `-v` flags. No flag keeps the error-only
/// default of [`telemetry::init`].
const RAISED_LEVELS: [Level; 4] = [Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

/// Parses the command line, sets up logging and picks the action to run.
///
/// # Errors
/// Returns an error if logging cannot be initialized or the arguments do not
/// describe a runnable flow.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(log_level(&matches))?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = crate::GIT_COMMIT_HASH,
        "bonsai-account starting"
    );

    dispatch::handler(&matches)
}

fn log_level(matches: &ArgMatches) -> Option<Level> {
    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or_default();

    match usize::from(verbosity) {
        0 => None,
        raised => RAISED_LEVELS
            .get(raised - 1)
            .or_else(|| RAISED_LEVELS.last())
            .copied(),
    }
}
