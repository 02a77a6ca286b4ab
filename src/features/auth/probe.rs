//! Authentication probe: the single "who am I" query behind every gate.
//!
//! Flow Overview:
//! 1) A gate asks for the outcome of the current epoch.
//! 2) Concurrent askers for the same epoch share one in-flight request.
//! 3) Transport failures, 5xx and 429 back off and retry; 401/403 is final.
//! 4) Authenticated outcomes are reused until `stale_time` passes; failures are
//!    never reused, so the next mount asks again.
//!
//! The probe never clears the session itself. Applying an outcome is the
//! gate's job because only the gate knows whether it is still mounted.

use super::{client::AuthApi, session::Epoch, types::User};
use crate::client::{AppConfig, AppError};
use rand::Rng;
use secrecy::SecretString;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{
    sync::OnceCell,
    time::{sleep, Instant},
};
use tracing::{debug, error, info, instrument, warn};

/// Exponential backoff for transient probe failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped,
    /// with up to 20% jitter taken off.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.8..=1.0);
        capped.mul_f64(jitter)
    }
}

/// Settled result of one probe.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    Authenticated(User),
    /// The backend refused the token (401/403).
    Rejected { status: u16 },
    /// No usable answer: retries exhausted, another non-2xx status, or a
    /// malformed response. Says nothing about the token.
    Failed(AppError),
}

impl ProbeOutcome {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Entry {
    settled: OnceCell<(ProbeOutcome, Instant)>,
}

pub struct AuthProbe<A> {
    api: Arc<A>,
    retry: RetryPolicy,
    stale_time: Duration,
    keep_alive: bool,
    entries: Mutex<HashMap<Epoch, Arc<Entry>>>,
}

impl<A: AuthApi> AuthProbe<A> {
    #[must_use]
    pub fn new(api: Arc<A>, config: &AppConfig) -> Self {
        Self {
            api,
            retry: config.retry.clone(),
            stale_time: config.stale_time,
            keep_alive: config.keep_alive,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Outcome for `token` as of `epoch`, shared with any concurrent caller of
    /// the same epoch.
    pub async fn fetch(&self, epoch: Epoch, token: &SecretString) -> ProbeOutcome {
        let entry = self.entry_for(epoch);
        let (outcome, _) = entry
            .settled
            .get_or_init(|| async { (self.run(epoch, token).await, Instant::now()) })
            .await;
        let outcome = outcome.clone();

        if !matches!(outcome, ProbeOutcome::Authenticated(_)) {
            self.evict(epoch, &entry);
        }
        outcome
    }

    /// Forgets every cached outcome, e.g. after the user's MFA state changed.
    pub fn invalidate(&self) {
        self.lock().clear();
        debug!("probe cache invalidated");
    }

    fn entry_for(&self, epoch: Epoch) -> Arc<Entry> {
        let mut entries = self.lock();
        entries.retain(|key, _| *key >= epoch);

        if let Some(entry) = entries.get(&epoch) {
            match entry.settled.get() {
                None => return entry.clone(),
                Some((ProbeOutcome::Authenticated(_), at)) if at.elapsed() < self.stale_time => {
                    return entry.clone();
                }
                Some(_) => {}
            }
        }

        let entry = Arc::new(Entry::default());
        entries.insert(epoch, entry.clone());
        entry
    }

    fn evict(&self, epoch: Epoch, entry: &Arc<Entry>) {
        let mut entries = self.lock();
        if entries
            .get(&epoch)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
        {
            entries.remove(&epoch);
        }
    }

    #[instrument(skip(self, token), fields(epoch = epoch.value()))]
    async fn run(&self, epoch: Epoch, token: &SecretString) -> ProbeOutcome {
        let mut attempt = 0;
        loop {
            match self.api.check(token, self.keep_alive).await {
                Ok(user) => {
                    debug!(role = %user.role, "session confirmed");
                    return ProbeOutcome::Authenticated(user);
                }
                Err(err) if err.is_auth_rejection() => {
                    let status = err.status().unwrap_or(401);
                    info!(status, "session rejected");
                    return ProbeOutcome::Rejected { status };
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(attempt, ?delay, "session check failed, backing off: {err}");
                    sleep(delay).await;
                }
                Err(err) => {
                    error!(attempt, "session check failed: {err}");
                    return ProbeOutcome::Failed(err);
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Epoch, Arc<Entry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
