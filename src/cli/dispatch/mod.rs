//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action that drives the matching gate or
//! screen.

use crate::cli::actions::{check, login, mfa, reset, Action};
use crate::cli::commands::{
    CMD_CHECK, CMD_LOGIN, CMD_LOGOUT, CMD_MFA, CMD_MFA_ENROLL, CMD_MFA_VERIFY,
    CMD_RESET_PASSWORD,
};
use crate::cli::globals::GlobalArgs;
use crate::features::auth::guards::Protection;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn string(matches: &clap::ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn redirect(matches: &clap::ArgMatches) -> String {
    string(matches, "redirect").unwrap_or_else(|| "/".to_string())
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (name, sub) = matches
        .subcommand()
        .context("missing subcommand")?;
    let globals = GlobalArgs::from_matches(sub);

    match name {
        CMD_CHECK => Ok(Action::Check(check::Args {
            globals,
            path: string(sub, "path").unwrap_or_else(|| "/".to_string()),
            protection: if sub.get_flag("session-only") {
                Protection::SessionOnly
            } else {
                Protection::Full
            },
        })),
        CMD_LOGIN => Ok(Action::Login(login::Args {
            globals,
            email: string(sub, "email").context("missing required argument: --email")?,
            password: string(sub, "password").map(SecretString::from),
            redirect: redirect(sub),
        })),
        CMD_MFA => {
            let (mfa_name, mfa_sub) = sub.subcommand().context("missing mfa subcommand")?;
            let globals = GlobalArgs::from_matches(mfa_sub);
            match mfa_name {
                CMD_MFA_VERIFY => Ok(Action::MfaVerify(mfa::Args {
                    globals,
                    code: string(mfa_sub, "code"),
                    redirect: redirect(mfa_sub),
                })),
                CMD_MFA_ENROLL => Ok(Action::MfaEnroll(mfa::Args {
                    globals,
                    code: string(mfa_sub, "code"),
                    redirect: redirect(mfa_sub),
                })),
                other => Err(anyhow!("unknown mfa subcommand: {other}")),
            }
        }
        CMD_LOGOUT => Ok(Action::Logout(globals)),
        CMD_RESET_PASSWORD => Ok(Action::ResetPassword(reset::Args {
            globals,
            code: string(sub, "code").context("missing required argument: --code")?,
            user_id: string(sub, "user-id").context("missing required argument: --user-id")?,
            password: string(sub, "password")
                .map(SecretString::from)
                .context("missing required argument: --password")?,
            confirmation: string(sub, "confirm")
                .map(SecretString::from)
                .context("missing required argument: --confirm")?,
        })),
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}
