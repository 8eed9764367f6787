use crate::auth::config::DEFAULT_TIMEOUT_SECONDS;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT_SECONDS: &str = "timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub timeout_seconds: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if the auth service URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .context("missing required argument: --api-url")?;
        let timeout_seconds = matches
            .get_one::<u64>(ARG_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        Ok(Self {
            url,
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Auth service base URL, example: https://api.bonsai.shop")
                .env("BONSAI_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_SECONDS)
                .long(ARG_TIMEOUT_SECONDS)
                .help("Request timeout in seconds")
                .env("BONSAI_TIMEOUT_SECONDS")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
}
