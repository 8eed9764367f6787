//! Terminal front end for one account flow. Each step gets its own prompt,
//! chosen by an exhaustive match on [`Step`], and every submission goes
//! through the [`FlowController`]. Errors are shown and the prompt repeats;
//! only closed input ends the flow early.

use crate::{
    auth::{ApiConfig, AuthService, HttpAuthService},
    flow::{FlowController, FlowHandle, FlowKind, PasswordResetInput, RegistrationInput, Step},
};
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Typed on the code prompt to ask for a new code.
const RESEND_COMMAND: &str = "resend";
/// Typed on the code prompt to start over with another email.
const RESTART_COMMAND: &str = "restart";

#[derive(Debug)]
pub struct Args {
    pub kind: FlowKind,
    pub api_url: String,
    pub timeout_seconds: u64,
}

/// Execute the flow action against stdin/stdout.
/// # Errors
/// Returns an error if the configuration is invalid or input closes before
/// the flow is done.
pub async fn execute(args: Args) -> Result<()> {
    let config = ApiConfig::new(&args.api_url, args.timeout_seconds)
        .context("invalid auth service configuration")?;
    let service = HttpAuthService::new(config).context("failed to build HTTP client")?;
    debug!(request_id = %service.request_id(), kind = %args.kind, "starting flow");

    let controller = FlowController::new(args.kind, service, FlowHandle::new());
    let mut input = BufReader::new(io::stdin());
    let mut output = io::stdout();

    run(&controller, &mut input, &mut output).await
}

/// Drives `controller` until the flow reaches `Done`.
///
/// # Errors
/// Returns an error if reading or writing fails, or input ends first.
pub async fn run<S, R, W>(controller: &FlowController<S>, input: &mut R, output: &mut W) -> Result<()>
where
    S: AuthService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let kind = controller.kind();
    let mut shown: Option<Step> = None;

    loop {
        let step = controller.state().step;
        if shown != Some(step) {
            write_line(output, "").await?;
            write_line(output, heading(kind, step)).await?;
            shown = Some(step);
        }

        let result = match step {
            Step::Email => {
                let email = prompt(input, output, "Email: ").await?;
                controller.submit_email(&email).await
            }
            Step::Otp => {
                let line = prompt(
                    input,
                    output,
                    &format!("Code ('{RESEND_COMMAND}' for a new one, '{RESTART_COMMAND}' to change email): "),
                )
                .await?;
                match line.trim() {
                    RESEND_COMMAND => {
                        let result = controller.resend_code().await;
                        if result.is_ok() {
                            write_line(output, "A new code is on the way.").await?;
                        }
                        result
                    }
                    RESTART_COMMAND => {
                        controller.reset();
                        continue;
                    }
                    code => controller.submit_code(code).await,
                }
            }
            Step::Final => match kind {
                FlowKind::Register => {
                    let full_name = prompt(input, output, "Full name: ").await?;
                    let phone = prompt(input, output, "Phone: ").await?;
                    let password = prompt(input, output, "Password: ").await?;
                    controller
                        .submit_registration(RegistrationInput {
                            full_name,
                            phone,
                            password: SecretString::from(password),
                        })
                        .await
                }
                FlowKind::Reset => {
                    let password = prompt(input, output, "New password: ").await?;
                    let confirmation = prompt(input, output, "Confirm new password: ").await?;
                    controller
                        .submit_password_reset(PasswordResetInput {
                            password: SecretString::from(password),
                            confirmation: SecretString::from(confirmation),
                        })
                        .await
                }
            },
            Step::Done => {
                write_line(output, completion(kind)).await?;
                info!(kind = %kind, "flow finished");
                return Ok(());
            }
        };

        if let Err(err) = result {
            let message = controller
                .state()
                .error
                .unwrap_or_else(|| err.user_message());
            write_line(output, &format!("Error: {message}")).await?;
        }
    }
}

fn heading(kind: FlowKind, step: Step) -> &'static str {
    match (kind, step) {
        (FlowKind::Register, Step::Email) => "Create account: enter your email to receive a code.",
        (FlowKind::Reset, Step::Email) => "Forgot password: enter the email of your account.",
        (_, Step::Otp) => "Check your inbox: enter the 6 character code we sent.",
        (FlowKind::Register, Step::Final) => "Almost there: tell us about yourself.",
        (FlowKind::Reset, Step::Final) => "Choose a new password.",
        (_, Step::Done) => "All done.",
    }
}

fn completion(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::Register => "Your account is ready. You can sign in now.",
        FlowKind::Reset => "Your password was changed. Sign in with the new one.",
    }
}

async fn prompt<R, W>(input: &mut R, output: &mut W, label: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(label.as_bytes()).await?;
    output.flush().await?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        bail!("input closed before the flow finished");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
