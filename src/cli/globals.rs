use crate::cli::commands::session::{ARG_API_URL, ARG_STATE_FILE};
use crate::client::AppConfig;
use crate::features::auth::{
    guards::AuthGate, probe::AuthProbe, state::AuthContext, storage::FileStorage, HttpAuthApi,
};
use anyhow::{Context, Result};
use std::{env, path::PathBuf, sync::Arc};
use tracing::debug;

pub const DEFAULT_STATE_FILE: &str = "gatehouse-session.json";

/// Options shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub state_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: Option<String>, state_file: Option<PathBuf>) -> Self {
        Self {
            api_url,
            state_file: state_file.unwrap_or_else(|| env::temp_dir().join(DEFAULT_STATE_FILE)),
        }
    }

    #[must_use]
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self::new(
            matches.get_one::<String>(ARG_API_URL).cloned(),
            matches.get_one::<String>(ARG_STATE_FILE).map(PathBuf::from),
        )
    }

    /// Environment config with the command-line URL on top.
    #[must_use]
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::load();
        if let Some(url) = &self.api_url {
            config.api_base_url = url.trim().to_string();
        }
        config
    }

    /// Auth context backed by the state file.
    #[must_use]
    pub fn context(&self) -> AuthContext {
        debug!(path = %self.state_file.display(), "opening session state");
        AuthContext::load(Arc::new(FileStorage::open(&self.state_file)))
    }

    /// Gate over HTTP plus the config it was built from.
    ///
    /// # Errors
    /// Returns an error if the API base URL is unusable.
    pub fn gate(&self) -> Result<(AuthGate<HttpAuthApi>, AppConfig)> {
        let config = self.config();
        let api = HttpAuthApi::from_config(&config).context("invalid API base URL")?;
        let probe = AuthProbe::new(Arc::new(api), &config);
        Ok((AuthGate::new(self.context(), Arc::new(probe)), config))
    }
}
