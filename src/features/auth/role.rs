//! Role store: the last-resolved role, kept for synchronous checks.
//!
//! A cache only. Each entry carries the session epoch it was resolved under and
//! reads for a different epoch come back empty.

use super::{
    session::Epoch,
    storage::{read_state, write_state, SessionStorage, ROLE_KEY},
    types::Role,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct PersistedRole {
    role: Option<Role>,
}

pub struct RoleStore {
    storage: Arc<dyn SessionStorage>,
    entry: RwLock<Option<(Role, Epoch)>>,
}

impl RoleStore {
    /// Hydrates the store, stamping any stored role with the epoch of the
    /// hydrated session. With no session, a leftover role is ignored.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>, session: Option<Epoch>) -> Self {
        let role = session
            .and_then(|_| read_state::<PersistedRole>(storage.as_ref(), ROLE_KEY))
            .and_then(|p| p.role);

        Self {
            storage,
            entry: RwLock::new(role.zip(session)),
        }
    }

    /// Last stored role, regardless of the session it came from.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        let entry = *self.entry.read().unwrap_or_else(PoisonError::into_inner);
        entry.map(|(role, _)| role)
    }

    /// Stored role, only if it was resolved under `epoch`.
    #[must_use]
    pub fn role_for(&self, epoch: Epoch) -> Option<Role> {
        match *self.entry.read().unwrap_or_else(PoisonError::into_inner) {
            Some((role, stamped)) if stamped == epoch => Some(role),
            _ => None,
        }
    }

    pub fn set_role(&self, role: Role, epoch: Epoch) {
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some((role, epoch));
        self.persist(Some(role));
    }

    pub fn clear(&self) {
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.persist(None);
    }

    fn persist(&self, role: Option<Role>) {
        let result = match role {
            Some(role) => write_state(
                self.storage.as_ref(),
                ROLE_KEY,
                &PersistedRole { role: Some(role) },
            ),
            None => self.storage.remove_item(ROLE_KEY),
        };
        if let Err(err) = result {
            warn!("failed to persist role: {err}");
        }
    }
}
