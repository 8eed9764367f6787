//! Maps validated CLI arguments to the flow action to run.

use crate::cli::actions::{flow::Args, Action};
use crate::cli::commands::{api, CMD_REGISTER, CMD_RESET_PASSWORD};
use crate::flow::FlowKind;
use anyhow::{bail, Result};

/// Map validated CLI matches to a flow action.
///
/// # Errors
/// Returns an error if the subcommand is unknown or the auth service URL is
/// missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (kind, sub_matches) = match matches.subcommand() {
        Some((CMD_REGISTER, sub_matches)) => (FlowKind::Register, sub_matches),
        Some((CMD_RESET_PASSWORD, sub_matches)) => (FlowKind::Reset, sub_matches),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("missing command: {CMD_REGISTER} or {CMD_RESET_PASSWORD}"),
    };

    let api_opts = api::Options::parse(sub_matches)?;

    Ok(Action::Flow(Args {
        kind,
        api_url: api_opts.url,
        timeout_seconds: api_opts.timeout_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_required() {
        temp_env::with_vars([("BONSAI_API_URL", None::<&str>)], || {
            let matches = crate::cli::commands::new().get_matches_from(vec!["bonsai-account", "register"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("missing required argument: --api-url"));
            }
        });
    }

    #[test]
    fn reset_password_maps_to_reset_flow() {
        temp_env::with_vars(
            [
                ("BONSAI_API_URL", Some("https://api.bonsai.shop")),
                ("BONSAI_TIMEOUT_SECONDS", None::<&str>),
            ],
            || {
                let matches = crate::cli::commands::new()
                    .get_matches_from(vec!["bonsai-account", "reset-password"]);
                let Ok(Action::Flow(args)) = handler(&matches) else {
                    panic!("dispatch failed");
                };
                assert_eq!(args.kind, FlowKind::Reset);
                assert_eq!(args.api_url, "https://api.bonsai.shop");
                assert_eq!(args.timeout_seconds, 10);
            },
        );
    }
}
