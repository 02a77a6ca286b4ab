//! Route gates. Gates never render anything themselves: they produce a
//! [`GateView`] and drive a [`Navigator`]. Every deferred side effect runs
//! through a [`Scope`] so it cannot outlive the gate or screen that started it.

pub mod auth;
pub mod mfa;
pub mod role;

pub use auth::{AuthGate, AuthStatus, MountedGate, Protection};
pub use mfa::MfaRequirement;
pub use role::RoleGate;

use super::types::User;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// What a gated route shows right now.
#[derive(Clone, Debug, PartialEq)]
pub enum GateView {
    Loading,
    Content(User),
    Redirect(String),
}

/// Where navigation requests go.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Navigator that records every location, in order.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Arc<Mutex<Vec<String>>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for History {
    fn navigate(&self, location: &str) {
        debug!(location, "navigate");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location.to_string());
    }
}

/// Lifetime token for deferred work. Once `close` returns, `apply` never runs
/// its closure again; a closure already running finishes first.
///
/// Navigation goes through [`Scope::navigate`], never through `apply`: moving
/// away is what drops the owner, and the owner's drop closes the scope.
#[derive(Clone, Debug)]
pub struct Scope {
    open: Arc<Mutex<bool>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: Arc::new(Mutex::new(true)),
        }
    }

    /// Runs `f` if the scope is still open. `f` must not block on the scope.
    pub fn apply<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        open.then(f)
    }

    /// Sends `navigator` to `location` if the scope is still open. The lock is
    /// released before navigating, so the navigator may close this scope.
    pub fn navigate(&self, navigator: &dyn Navigator, location: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        navigator.navigate(location);
        true
    }

    pub fn close(&self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
