use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ENV_LOG_LEVEL: &str = "BONSAI_LOG_LEVEL";

/// Level names accepted by `BONSAI_LOG_LEVEL`, indexed by verbosity.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name or its verbosity number (`0` for error up to `4` for
/// trace).
///
/// # Errors
/// Returns a message listing the accepted values.
pub fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim().to_lowercase();
    let by_number = level
        .parse::<usize>()
        .ok()
        .filter(|index| *index < LOG_LEVELS.len());
    let by_name = || LOG_LEVELS.iter().position(|name| *name == level);

    by_number
        .or_else(by_name)
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{level}', expected 0-{} or one of: {}",
                LOG_LEVELS.len() - 1,
                LOG_LEVELS.join(", ")
            )
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log output; repeat up to -vvvv for trace")
            .long_help(
                "Log level on stderr. Each -v raises it one step from error: warn, info, debug, trace",
            )
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_log_level)),
    )
}
