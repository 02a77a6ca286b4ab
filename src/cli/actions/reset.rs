use crate::cli::globals::GlobalArgs;
use crate::features::auth::guards::History;
use crate::routes::PasswordResetScreen;
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub code: String,
    pub user_id: String,
    pub password: SecretString,
    pub confirmation: SecretString,
}

/// # Errors
/// Returns an error if the input fails local checks or the backend refuses it.
pub async fn execute(args: Args) -> Result<()> {
    let (gate, _) = args.globals.gate()?;
    let history = History::new();
    let mut screen = PasswordResetScreen::new(&gate, Arc::new(history.clone()));

    if let Err(err) = screen
        .submit(&args.code, args.password, &args.confirmation, &args.user_id)
        .await
    {
        let notice = screen.notice().cloned().unwrap_or_else(|| err.notice());
        return Err(anyhow!("{notice}"));
    }
    if let Some(notice) = screen.notice() {
        println!("{notice}");
    }
    if let Some(target) = history.last() {
        println!("continue at {target}");
    }
    Ok(())
}
