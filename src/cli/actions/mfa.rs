use crate::cli::globals::GlobalArgs;
use crate::features::auth::guards::History;
use crate::routes::{intent, paths, MfaEnrollScreen, MfaVerifyScreen};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub code: Option<String>,
    pub redirect: String,
}

fn query_for(route: &str, redirect: &str) -> String {
    let location = intent::with_redirect(route, redirect);
    intent::split_location(&location).1.to_string()
}

/// Verifies the session's second factor and follows the deferred redirect.
/// # Errors
/// Returns an error if the code is malformed or rejected.
pub async fn verify(args: Args) -> Result<()> {
    let (gate, config) = args.globals.gate()?;
    let code = args.code.context("missing required argument: --code")?;
    let history = History::new();
    let query = query_for(paths::MFA_VERIFY, &args.redirect);
    let mut screen = MfaVerifyScreen::from_query(&gate, Arc::new(history.clone()), &config, &query);

    screen.set_code(code);
    if let Err(err) = screen.submit().await {
        let notice = screen.notice().cloned().unwrap_or_else(|| err.notice());
        return Err(anyhow!("{notice}"));
    }
    if let Some(notice) = screen.notice() {
        println!("{notice}");
    }

    screen.finished().await;
    if let Some(target) = history.last() {
        println!("continue at {target}");
    }
    Ok(())
}

/// Prints provisioning data, and enrolls when a code is given.
/// # Errors
/// Returns an error if setup fails or the code is malformed or rejected.
pub async fn enroll(args: Args) -> Result<()> {
    let (gate, config) = args.globals.gate()?;
    let history = History::new();
    let query = query_for(paths::MFA_ENABLE, &args.redirect);
    let mut screen = MfaEnrollScreen::from_query(&gate, Arc::new(history.clone()), &config, &query);

    let Some(code) = args.code else {
        let setup = screen
            .begin()
            .await
            .map_err(|err| anyhow!("{}", err.notice()))?;
        println!("secret: {}", setup.secret);
        println!("otpauth: {}", setup.otpauth_url);
        println!("add it to your authenticator, then run `gatehouse mfa enroll --code <code>`");
        return Ok(());
    };

    screen.set_code(code);
    if let Err(err) = screen.submit().await {
        let notice = screen.notice().cloned().unwrap_or_else(|| err.notice());
        return Err(anyhow!("{notice}"));
    }
    println!("authenticator enrolled");
    if let Some(target) = history.last() {
        println!("continue at {target}");
    }
    Ok(())
}
