//! Auth context shared by gates and screens. It bundles the session and role
//! stores and is the only writer of either; everything else reads. The
//! context is cheap to clone and is passed explicitly instead of living in a
//! global.

use super::{
    role::RoleStore,
    session::{Epoch, SessionStore},
    storage::{MemoryStorage, SessionStorage},
    types::{Role, User},
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
/// Auth session context passed to gates, screens and role checks.
pub struct AuthContext {
    session: Arc<SessionStore>,
    roles: Arc<RoleStore>,
}

impl AuthContext {
    /// Hydrates both stores from the same storage backend.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let session = SessionStore::load(storage.clone());
        let (token, epoch) = session.snapshot();
        let roles = RoleStore::load(storage, token.map(|_| epoch));
        Self {
            session: Arc::new(session),
            roles: Arc::new(roles),
        }
    }

    /// Context backed by fresh in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStorage::new()))
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }

    /// True while a token is held. Not proof the backend accepts it.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.session.token().is_some()
    }

    /// Role for the current session only.
    #[must_use]
    pub fn current_role(&self) -> Option<Role> {
        self.roles.role_for(self.session.epoch())
    }

    /// Stores a freshly issued token, dropping user and role from the previous one.
    pub fn sign_in(&self, token: SecretString) -> Epoch {
        let epoch = self
            .session
            .replace_token(Some(token), || self.roles.clear());
        info!(epoch = epoch.value(), "signed in");
        epoch
    }

    /// Forgets the token, user and role.
    pub fn sign_out(&self) -> Epoch {
        let epoch = self.session.replace_token(None, || self.roles.clear());
        info!(epoch = epoch.value(), "signed out");
        epoch
    }

    /// Applies a probed user if `epoch` is still the session's epoch. Returns
    /// false when the token changed while the probe was in flight.
    pub fn apply_user(&self, epoch: Epoch, user: &User) -> bool {
        let applied = self.session.mirror_user_if_current(epoch, user, || {
            self.roles.set_role(user.role, epoch);
        });
        if !applied {
            debug!(epoch = epoch.value(), "discarding user for stale session");
        }
        applied
    }

    /// Drops the session after the backend rejected it, unless the token has
    /// already been replaced. Returns the epoch of the cleared session.
    pub fn reject(&self, epoch: Epoch) -> Option<Epoch> {
        let cleared = self
            .session
            .clear_if_current(epoch, || self.roles.clear());
        if cleared.is_some() {
            info!(epoch = epoch.value(), "session rejected by backend");
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn apply_user_populates_role_for_current_epoch() {
        let ctx = AuthContext::in_memory();
        let epoch = ctx.sign_in(SecretString::from("abc".to_string()));

        assert!(ctx.apply_user(epoch, &user(Role::Staff)));
        assert_eq!(ctx.current_role(), Some(Role::Staff));
        assert_eq!(ctx.session().user().map(|u| u.role), Some(Role::Staff));
    }

    #[test]
    fn stale_user_never_reaches_role_store() {
        let ctx = AuthContext::in_memory();
        let old = ctx.sign_in(SecretString::from("old".to_string()));
        ctx.sign_in(SecretString::from("new".to_string()));

        assert!(!ctx.apply_user(old, &user(Role::SystemAdmin)));
        assert_eq!(ctx.current_role(), None);
        assert_eq!(ctx.roles().role(), None);
    }

    #[test]
    fn sign_out_clears_everything() {
        let ctx = AuthContext::in_memory();
        let epoch = ctx.sign_in(SecretString::from("abc".to_string()));
        ctx.apply_user(epoch, &user(Role::Business));

        ctx.sign_out();
        assert!(!ctx.has_token());
        assert!(ctx.session().user().is_none());
        assert_eq!(ctx.roles().role(), None);
    }

    #[test]
    fn reject_only_clears_matching_epoch() {
        let ctx = AuthContext::in_memory();
        let old = ctx.sign_in(SecretString::from("old".to_string()));
        let current = ctx.sign_in(SecretString::from("new".to_string()));
        ctx.apply_user(current, &user(Role::Staff));

        assert_eq!(ctx.reject(old), None);
        assert!(ctx.has_token());
        assert_eq!(ctx.current_role(), Some(Role::Staff));

        assert_eq!(ctx.reject(current), Some(current.next()));
        assert!(!ctx.has_token());
        assert_eq!(ctx.current_role(), None);
    }

    #[test]
    fn role_is_not_hydrated_without_a_token() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let ctx = AuthContext::load(storage.clone());
        let epoch = ctx.sign_in(SecretString::from("abc".to_string()));
        ctx.apply_user(epoch, &user(Role::Staff));
        // The role record outlives a token removal that it should have followed.
        ctx.session().clear();

        let reloaded = AuthContext::load(storage);
        assert!(!reloaded.has_token());
        assert_eq!(reloaded.current_role(), None);
        assert_eq!(reloaded.roles().role(), None);
    }
}
