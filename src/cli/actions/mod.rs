pub mod check;
pub mod login;
pub mod logout;
pub mod mfa;
pub mod reset;

// Internal "interpreter" for `Action`.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Check(check::Args),
    Login(login::Args),
    MfaVerify(mfa::Args),
    MfaEnroll(mfa::Args),
    Logout(GlobalArgs),
    ResetPassword(reset::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
