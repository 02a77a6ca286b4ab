//! Client configuration with defaults and `GATEHOUSE_*` environment overrides.
//! Values are public; do not store secrets here.

use crate::features::auth::probe::RetryPolicy;
use std::{env::var, time::Duration};

/// Default request timeout (milliseconds) applied to all HTTP helpers.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Delay between a confirmed MFA verification and the navigation away from it.
pub const DEFAULT_CONFIRM_DELAY_MS: u64 = 1_500;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

pub const ENV_API_BASE_URL: &str = "GATEHOUSE_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "GATEHOUSE_REQUEST_TIMEOUT_MS";
pub const ENV_PROBE_RETRIES: &str = "GATEHOUSE_PROBE_RETRIES";
pub const ENV_PROBE_BACKOFF_MS: &str = "GATEHOUSE_PROBE_BACKOFF_MS";
pub const ENV_PROBE_STALE_MS: &str = "GATEHOUSE_PROBE_STALE_MS";
pub const ENV_KEEP_ALIVE: &str = "GATEHOUSE_KEEP_ALIVE";
pub const ENV_CONFIRM_DELAY_MS: &str = "GATEHOUSE_MFA_CONFIRM_MS";
pub const ENV_DEFAULT_ROUTE: &str = "GATEHOUSE_DEFAULT_ROUTE";

/// Client configuration shared by the probe, the gates and the screens.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// How long an authenticated probe result is served without refetching.
    pub stale_time: Duration,
    /// Ask the backend to extend the session on every probe.
    pub keep_alive: bool,
    pub confirm_delay: Duration,
    pub default_route: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryPolicy::default(),
            stale_time: Duration::ZERO,
            keep_alive: false,
            confirm_delay: Duration::from_millis(DEFAULT_CONFIRM_DELAY_MS),
            default_route: crate::routes::paths::DASHBOARD.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads defaults and applies environment overrides.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        apply_overrides(&mut config, Overrides::from_env());
        config
    }
}

#[derive(Default)]
struct Overrides {
    api_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    probe_retries: Option<u32>,
    probe_backoff_ms: Option<u64>,
    probe_stale_ms: Option<u64>,
    keep_alive: Option<bool>,
    confirm_delay_ms: Option<u64>,
    default_route: Option<String>,
}

impl Overrides {
    fn from_env() -> Self {
        let read = |key: &str| var(key).ok().and_then(|value| normalize_value(&value));

        Self {
            api_base_url: read(ENV_API_BASE_URL),
            request_timeout_ms: read(ENV_REQUEST_TIMEOUT_MS).and_then(|v| v.parse().ok()),
            probe_retries: read(ENV_PROBE_RETRIES).and_then(|v| v.parse().ok()),
            probe_backoff_ms: read(ENV_PROBE_BACKOFF_MS).and_then(|v| v.parse().ok()),
            probe_stale_ms: read(ENV_PROBE_STALE_MS).and_then(|v| v.parse().ok()),
            keep_alive: read(ENV_KEEP_ALIVE).and_then(|v| parse_flag(&v)),
            confirm_delay_ms: read(ENV_CONFIRM_DELAY_MS).and_then(|v| v.parse().ok()),
            default_route: read(ENV_DEFAULT_ROUTE).filter(|route| route.starts_with('/')),
        }
    }
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) {
    if let Some(value) = overrides.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = overrides.request_timeout_ms {
        config.request_timeout = Duration::from_millis(value);
    }
    if let Some(value) = overrides.probe_retries {
        config.retry.max_retries = value;
    }
    if let Some(value) = overrides.probe_backoff_ms {
        config.retry.base_delay = Duration::from_millis(value);
    }
    if let Some(value) = overrides.probe_stale_ms {
        config.stale_time = Duration::from_millis(value);
    }
    if let Some(value) = overrides.keep_alive {
        config.keep_alive = value;
    }
    if let Some(value) = overrides.confirm_delay_ms {
        config.confirm_delay = Duration::from_millis(value);
    }
    if let Some(value) = overrides.default_route {
        config.default_route = value;
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
