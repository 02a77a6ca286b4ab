pub mod logging;
pub mod session;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_CHECK: &str = "check";
pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_MFA: &str = "mfa";
pub const CMD_MFA_VERIFY: &str = "verify";
pub const CMD_MFA_ENROLL: &str = "enroll";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

fn redirect_arg() -> Arg {
    Arg::new("redirect")
        .long("redirect")
        .help("Route to return to afterwards")
        .default_value("/")
}

fn code_arg() -> Arg {
    Arg::new("code")
        .short('c')
        .long("code")
        .help("Six-digit code from the authenticator app")
}

fn check_command() -> Command {
    Command::new(CMD_CHECK)
        .about("Resolve the stored session against a route")
        .arg(
            Arg::new("path")
                .help("Route to gate")
                .default_value("/"),
        )
        .arg(
            Arg::new("session-only")
                .long("session-only")
                .help("Skip the MFA requirement, as the MFA screens do")
                .action(ArgAction::SetTrue),
        )
}

fn login_command() -> Command {
    Command::new(CMD_LOGIN)
        .about("Sign in and store the session token")
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .help("Account email")
                .env("GATEHOUSE_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Account password (read from stdin when omitted)")
                .env("GATEHOUSE_PASSWORD")
                .hide_env_values(true),
        )
        .arg(redirect_arg())
}

fn mfa_command() -> Command {
    Command::new(CMD_MFA)
        .about("Second-factor verification and enrollment")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_MFA_VERIFY)
                .about("Verify this session with an authenticator code")
                .arg(code_arg().required(true))
                .arg(redirect_arg()),
        )
        .subcommand(
            Command::new(CMD_MFA_ENROLL)
                .about("Enroll an authenticator; without --code only prints the secret")
                .arg(code_arg())
                .arg(redirect_arg()),
        )
}

fn reset_password_command() -> Command {
    Command::new(CMD_RESET_PASSWORD)
        .about("Apply a password reset code")
        .arg(
            Arg::new("code")
                .long("code")
                .help("Reset code from the email")
                .required(true),
        )
        .arg(
            Arg::new("user-id")
                .long("user-id")
                .help("Account id from the reset link")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("New password")
                .env("GATEHOUSE_NEW_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("confirm")
                .long("confirm")
                .help("New password again")
                .required(true),
        )
}

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

    let command = Command::new("gatehouse")
        .about("Session, MFA and role gating for the dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(check_command())
        .subcommand(login_command())
        .subcommand(mfa_command())
        .subcommand(Command::new(CMD_LOGOUT).about("Forget the stored session"))
        .subcommand(reset_password_command());

    let command = session::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "gatehouse");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session, MFA and role gating for the dashboard".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_defaults() {
        temp_env::with_vars([("GATEHOUSE_LOG_LEVEL", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["gatehouse", "check"]);
            let Some((name, sub)) = matches.subcommand() else {
                panic!("expected subcommand");
            };
            assert_eq!(name, CMD_CHECK);
            assert_eq!(sub.get_one::<String>("path").map(String::as_str), Some("/"));
            assert!(!sub.get_flag("session-only"));
        });
    }

    #[test]
    fn test_mfa_verify_requires_code() {
        let result = new().try_get_matches_from(vec!["gatehouse", "mfa", "verify"]);
        assert!(result.is_err());

        let matches = new()
            .try_get_matches_from(vec!["gatehouse", "mfa", "verify", "-c", "123456"])
            .ok();
        let code = matches
            .as_ref()
            .and_then(|m| m.subcommand_matches(CMD_MFA))
            .and_then(|m| m.subcommand_matches(CMD_MFA_VERIFY))
            .and_then(|m| m.get_one::<String>("code").cloned());
        assert_eq!(code.as_deref(), Some("123456"));
    }

    #[test]
    fn test_login_env() {
        temp_env::with_vars(
            [
                ("GATEHOUSE_EMAIL", Some("staff@example.com")),
                ("GATEHOUSE_PASSWORD", Some("Passw0rd")),
            ],
            || {
                let matches = new().get_matches_from(vec!["gatehouse", "login"]);
                let sub = matches.subcommand_matches(CMD_LOGIN);
                assert_eq!(
                    sub.and_then(|m| m.get_one::<String>("email").cloned()),
                    Some("staff@example.com".to_string())
                );
                assert_eq!(
                    sub.and_then(|m| m.get_one::<String>("password").cloned()),
                    Some("Passw0rd".to_string())
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("GATEHOUSE_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["gatehouse", "logout"]);
                assert_eq!(
                    matches
                        .get_one::<u8>(logging::ARG_VERBOSITY)
                        .map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5usize {
            temp_env::with_vars([("GATEHOUSE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["gatehouse".to_string(), "logout".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches
                        .get_one::<u8>(logging::ARG_VERBOSITY)
                        .map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
