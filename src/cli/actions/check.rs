use crate::cli::globals::GlobalArgs;
use crate::features::auth::{
    guards::{AuthStatus, GateView, History, Protection},
    types::User,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
    pub protection: Protection,
}

/// Mounts the gate on `path` and reports where it lands.
/// # Errors
/// Returns an error if the client cannot be built.
pub async fn execute(args: Args) -> Result<()> {
    let (gate, _) = args.globals.gate()?;
    let history = History::new();

    let mounted = gate.mount(args.path.clone(), args.protection, Arc::new(history.clone()));
    let status = mounted.settled().await;
    debug!(?status, navigations = ?history.entries(), "gate settled");

    if status == AuthStatus::Unavailable {
        println!("{}: backend unavailable, session kept", args.path);
    } else {
        println!("{}", describe(&args.path, &mounted.view()));
    }
    if let Some(role) = gate.context().current_role() {
        println!("role: {role}");
    }
    Ok(())
}

pub(crate) fn describe(path: &str, view: &GateView) -> String {
    match view {
        GateView::Loading => format!("{path}: still checking"),
        GateView::Content(user) => format!("{path}: allowed for {}", who(user)),
        GateView::Redirect(target) => format!("{path}: redirect to {target}"),
    }
}

fn who(user: &User) -> String {
    user.email()
        .map_or_else(|| format!("user {}", user.id), ToString::to_string)
}
