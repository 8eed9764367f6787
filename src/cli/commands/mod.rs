pub mod api;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

pub const CMD_REGISTER: &str = "register";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("bonsai-account")
        .about("Bonsai storefront account registration and password reset")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create a storefront account: email, code, then name, phone and password"),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Reset a forgotten password: email, code, then the new password"),
        );

    let command = api::with_args(command);
    logging::with_args(command)
}
