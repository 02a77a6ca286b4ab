//! Session store: the bearer token and the last user resolved for it.
//!
//! Every token change advances the [`Epoch`]. Anything fetched for an older
//! epoch is stale and must not be applied; the store enforces that for the
//! mirrored user and the probe/gates enforce it for everything else.

use super::{
    storage::{read_state, write_state, SessionStorage, AUTHENTICATION_KEY, USER_KEY},
    types::User,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Generation counter of the session token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedToken {
    token: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct PersistedUser {
    user: Option<User>,
}

struct SessionState {
    token: Option<SecretString>,
    user: Option<User>,
    epoch: Epoch,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
    epochs: watch::Sender<Epoch>,
}

impl SessionStore {
    /// Hydrates the store from session storage. A stored user without a token is
    /// ignored.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let token = read_state::<PersistedToken>(storage.as_ref(), AUTHENTICATION_KEY)
            .and_then(|persisted| persisted.token)
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);

        let user = token.as_ref().and_then(|_| {
            read_state::<PersistedUser>(storage.as_ref(), USER_KEY).and_then(|persisted| persisted.user)
        });

        debug!(has_token = token.is_some(), "session store hydrated");

        let epoch = Epoch::default();
        let (epochs, _) = watch::channel(epoch);

        Self {
            storage,
            state: RwLock::new(SessionState { token, user, epoch }),
            epochs,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.read().epoch
    }

    /// Token and epoch read together.
    #[must_use]
    pub fn snapshot(&self) -> (Option<SecretString>, Epoch) {
        let state = self.read();
        (state.token.clone(), state.epoch)
    }

    /// Last user resolved for the current token, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Replaces the token (absent clears it), drops the mirrored user and
    /// notifies subscribers. Returns the new epoch.
    pub fn set_token(&self, token: Option<SecretString>) -> Epoch {
        self.replace_token(token, || {})
    }

    pub fn clear(&self) -> Epoch {
        self.set_token(None)
    }

    /// `set_token`, running `also` under the same lock.
    pub(crate) fn replace_token(&self, token: Option<SecretString>, also: impl FnOnce()) -> Epoch {
        let epoch = {
            let mut state = self.write();
            state.token = token;
            state.user = None;
            state.epoch = state.epoch.next();
            self.persist_token(state.token.as_ref());
            self.persist_user(None);
            also();
            state.epoch
        };
        debug!(epoch = epoch.value(), "session token replaced");
        self.epochs.send_replace(epoch);
        epoch
    }

    /// Watches token changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Epoch> {
        self.epochs.subscribe()
    }

    /// Mirrors `user` if `epoch` is still current, running `also` under the same
    /// lock so dependent caches move in step.
    pub(crate) fn mirror_user_if_current(
        &self,
        epoch: Epoch,
        user: &User,
        also: impl FnOnce(),
    ) -> bool {
        let mut state = self.write();
        if state.epoch != epoch {
            return false;
        }
        state.user = Some(user.clone());
        self.persist_user(Some(user));
        also();
        true
    }

    /// Clears the token only if `epoch` is still current.
    pub(crate) fn clear_if_current(&self, epoch: Epoch, also: impl FnOnce()) -> Option<Epoch> {
        let next = {
            let mut state = self.write();
            if state.epoch != epoch {
                return None;
            }
            state.token = None;
            state.user = None;
            state.epoch = state.epoch.next();
            self.persist_token(None);
            self.persist_user(None);
            also();
            state.epoch
        };
        self.epochs.send_replace(next);
        Some(next)
    }

    fn persist_token(&self, token: Option<&SecretString>) {
        let persisted = PersistedToken {
            token: token.map(|token| token.expose_secret().to_string()),
        };
        if let Err(err) = write_state(self.storage.as_ref(), AUTHENTICATION_KEY, &persisted) {
            warn!("failed to persist session token: {err}");
        }
    }

    fn persist_user(&self, user: Option<&User>) {
        let result = match user {
            Some(user) => write_state(
                self.storage.as_ref(),
                USER_KEY,
                &PersistedUser {
                    user: Some(user.clone()),
                },
            ),
            None => self.storage.remove_item(USER_KEY),
        };
        if let Err(err) = result {
            warn!("failed to persist user record: {err}");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::{
        storage::{write_state, MemoryStorage},
        types::Role,
    };
    use serde_json::Map;

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            role,
            mfa_enabled: true,
            mfa_verified: true,
            profile: Map::new(),
        }
    }

    #[test]
    fn set_token_persists_and_advances_epoch() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone());
        assert!(store.token().is_none());

        let epoch = store.set_token(Some(SecretString::from("abc".to_string())));
        assert_eq!(epoch.value(), 1);
        assert_eq!(
            store.token().map(|t| t.expose_secret().to_string()),
            Some("abc".to_string())
        );

        let reloaded = SessionStore::load(storage);
        assert_eq!(
            reloaded.token().map(|t| t.expose_secret().to_string()),
            Some("abc".to_string())
        );
    }

    #[test]
    fn token_change_drops_mirrored_user() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new()));
        let epoch = store.set_token(Some(SecretString::from("one".to_string())));
        assert!(store.mirror_user_if_current(epoch, &user(Role::Staff), || {}));
        assert!(store.user().is_some());

        store.set_token(Some(SecretString::from("two".to_string())));
        assert!(store.user().is_none());
    }

    #[test]
    fn stale_epoch_cannot_mirror_user() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new()));
        let old = store.set_token(Some(SecretString::from("one".to_string())));
        store.set_token(Some(SecretString::from("two".to_string())));

        let mut hook_ran = false;
        assert!(!store.mirror_user_if_current(old, &user(Role::Staff), || hook_ran = true));
        assert!(!hook_ran);
        assert!(store.user().is_none());
    }

    #[test]
    fn clear_if_current_ignores_stale_epoch() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new()));
        let old = store.set_token(Some(SecretString::from("one".to_string())));
        let current = store.set_token(Some(SecretString::from("two".to_string())));

        assert_eq!(store.clear_if_current(old, || {}), None);
        assert!(store.token().is_some());

        assert_eq!(store.clear_if_current(current, || {}), Some(current.next()));
        assert!(store.token().is_none());
    }

    #[test]
    fn load_ignores_user_without_token() {
        let storage = Arc::new(MemoryStorage::new());
        write_state(
            storage.as_ref(),
            USER_KEY,
            &PersistedUser {
                user: Some(user(Role::Business)),
            },
        )
        .unwrap();

        let store = SessionStore::load(storage);
        assert!(store.user().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_token_changes() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new()));
        let mut changes = store.subscribe();

        let epoch = store.clear();
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow(), epoch);
    }
}
