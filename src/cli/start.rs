use crate::cli::{
    actions::Action,
    commands::{self, logging::LogSettings},
    dispatch, telemetry,
};
use anyhow::Result;

/// Parses the command line, installs logging and picks the action to run.
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the arguments do not
/// describe a runnable action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(LogSettings::from_matches(&matches))?;

    dispatch::handler(&matches)
}
