use crate::client::config::ENV_API_BASE_URL;
use clap::{Arg, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_FILE: &str = "state-file";
pub const ENV_STATE_FILE: &str = "GATEHOUSE_STATE_FILE";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Backend base URL, example: https://api.example.com")
                .env(ENV_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_FILE)
                .long(ARG_STATE_FILE)
                .help("Where the session token, user and role are kept between runs")
                .env(ENV_STATE_FILE)
                .global(true),
        )
}
