use crate::cli::{actions::check::describe, globals::GlobalArgs};
use crate::features::auth::guards::{History, Protection};
use crate::routes::{intent, LoginScreen};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::{io::BufRead, sync::Arc};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: Option<SecretString>,
    pub redirect: String,
}

/// Signs in, then shows what the gate asks for next on the redirect target.
/// # Errors
/// Returns an error if validation or the login request fails.
pub async fn execute(args: Args) -> Result<()> {
    let (gate, config) = args.globals.gate()?;
    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };

    let history = History::new();
    let location = intent::login_location(&args.redirect);
    let (_, query) = intent::split_location(&location);
    let mut screen = LoginScreen::from_query(&gate, Arc::new(history.clone()), &config, query);
    screen.set_email(args.email);
    screen.set_password(password);

    if let Err(err) = screen.submit().await {
        let notice = screen.notice().cloned().unwrap_or_else(|| err.notice());
        return Err(anyhow!("{notice}"));
    }
    println!("signed in");

    let target = history
        .last()
        .unwrap_or_else(|| screen.redirect_target().to_string());
    let mounted = gate.mount(target.clone(), Protection::Full, Arc::new(History::new()));
    mounted.settled().await;
    println!("{}", describe(&target, &mounted.view()));
    Ok(())
}

fn read_password() -> Result<SecretString> {
    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    Ok(SecretString::from(password))
}
