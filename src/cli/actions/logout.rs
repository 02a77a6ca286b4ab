use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Clears the stored token, user and role.
/// # Errors
/// Never fails today; persistence problems are logged.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    let ctx = globals.context();
    let had_token = ctx.has_token();
    ctx.sign_out();
    if had_token {
        println!("signed out");
    } else {
        println!("no session to sign out of");
    }
    Ok(())
}
