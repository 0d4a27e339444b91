mod cli;
mod daemon;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use duesly_client::ClientError;
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;

const ROOT_HELP: &str = "Duesly - monthly dues tracking for small groups

Usage:
  duesly <command>

Start here:
  duesly member register <name> <phone> --email <address>
  duesly contribution generate
  duesly dash
";

const TOP_LEVEL_HELP: &str = "Duesly - monthly dues tracking for small groups

USAGE: duesly [--home <dir>] [--json] <command>

Members:
  duesly member register <name> <phone>                   Register a member (admin)
  duesly member signup <name> <phone> <email>             Self-service signup with a password
  duesly member list                                      Members with payment classification
  duesly member dashboard <member-id>                     Upcoming dues and payment statistics
  duesly member preferences <member-id>                   View or change reminder channels

Contributions:
  1. duesly contribution import --dry-run <path>          Validate a payment history CSV
  2. duesly contribution import <path>                    Load payment history
  3. duesly contribution generate                         Create this month's contributions
  duesly contribution pay <contribution-id>               Record a payment
  duesly contribution status                              Every contribution with its status
  duesly contribution failed                              Payments more than 30 days overdue

Risk and reminders:
  duesly insights predictions                             Members likely to pay late
  duesly dash                                             Collection overview
  duesly reminder run                                     Send due reminders now
  duesly scheduler serve                                  Run the daily reminder check until Ctrl-C

Change requests:
  duesly ticket create <member-id> --type monthly_amount --value <amount> --reason <text>
  duesly ticket resolve <ticket-id> --status approved

Run `duesly <command> --help` for command usage.
Set DUESLY_LOG (for example `DUESLY_LOG=debug`) to see diagnostic logs on stderr.
";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    init_logging(cli.command.is_daemon());
    let mode = output::mode_for_cli(&cli);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if error.is_internal() {
                tracing::error!(code = %error.code, message = %error.message, "command failed");
            }
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let help = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&help).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let command_hint = if matches!(
                kind,
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = output::infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

/// Logs go to stderr; stdout carries only the text or JSON payload.
/// `DUESLY_LOG` takes an `EnvFilter` directive. Defaults to `info` for the
/// scheduler daemon and `warn` otherwise.
fn init_logging(daemon: bool) {
    let default_directive = if daemon { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("DUESLY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information" hint)
/// so our "What to do next" section is the single source of guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Builds the subcommand path from raw CLI args for use in help hints.
///
/// Skips flags and the value following `--home`, then matches the leading
/// words against the known command groups.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let mut words = Vec::new();
    let mut skip_next = false;
    for value in raw_args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value == "--home" {
            skip_next = true;
            continue;
        }
        if value.starts_with('-') {
            continue;
        }
        words.push(value.as_str());
    }

    let group = words.first().copied()?;
    let subcommands: &[&str] = match group {
        "member" => &[
            "register",
            "signup",
            "list",
            "search",
            "settings",
            "preferences",
            "password",
            "login",
            "dashboard",
            "history",
            "notifications",
        ],
        "contribution" => &["generate", "pay", "pay-all", "status", "failed", "import"],
        "ticket" => &["create", "list", "resolve"],
        "insights" => &["predictions", "member"],
        "reminder" => &["run", "send", "history", "schedule"],
        "scheduler" => &["serve"],
        "dash" => return Some("dash".to_string()),
        _ => return None,
    };
    match words.get(1) {
        Some(sub) if subcommands.contains(sub) => Some(format!("{group} {sub}")),
        _ => Some(group.to_string()),
    }
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_internal() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, is_top_level_help_request, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_path_skips_home_value_and_flags() {
        let hint = command_path_from_args(&args(&[
            "duesly",
            "--home",
            "/tmp/member",
            "contribution",
            "pay",
            "--paid-date",
        ]));
        assert_eq!(hint.as_deref(), Some("contribution pay"));
    }

    #[test]
    fn command_path_falls_back_to_group() {
        assert_eq!(
            command_path_from_args(&args(&["duesly", "ticket", "close"])).as_deref(),
            Some("ticket")
        );
        assert_eq!(
            command_path_from_args(&args(&["duesly", "dash", "--json"])).as_deref(),
            Some("dash")
        );
        assert!(command_path_from_args(&args(&["duesly", "payroll"])).is_none());
    }

    #[test]
    fn clap_usage_tail_is_removed() {
        let message = "error: invalid value 'x' for '--amount <AMOUNT>'\n\nUsage: duesly member register";
        assert_eq!(
            strip_clap_boilerplate(message),
            "error: invalid value 'x' for '--amount <AMOUNT>'"
        );
    }

    #[test]
    fn only_bare_help_flag_is_top_level() {
        assert!(is_top_level_help_request(&args(&["duesly", "--help"])));
        assert!(!is_top_level_help_request(&args(&["duesly", "member", "--help"])));
    }
}
