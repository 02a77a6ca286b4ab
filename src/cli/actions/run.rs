use crate::cli::actions::{check, login, logout, mfa, reset, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Check(args) => check::execute(args).await,
        Action::Login(args) => login::execute(args).await,
        Action::MfaVerify(args) => mfa::verify(args).await,
        Action::MfaEnroll(args) => mfa::enroll(args).await,
        Action::Logout(globals) => logout::execute(&globals),
        Action::ResetPassword(args) => reset::execute(args).await,
    }
}
