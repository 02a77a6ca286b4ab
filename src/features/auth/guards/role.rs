//! Role gate for fragments inside an already-authenticated page.
//!
//! Reads the role cached for the current session only. It never fetches, never
//! navigates and has no loading state; UX only, the API enforces access.

use crate::features::auth::{state::AuthContext, types::Role};
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleGate {
    required: Vec<Role>,
}

impl RoleGate {
    pub fn new(required: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn permits(&self, role: Option<Role>) -> bool {
        role.is_some_and(|role| self.required.contains(&role))
    }

    /// Produces `children` when the current role is allowed, nothing otherwise.
    pub fn render<T>(&self, ctx: &AuthContext, children: impl FnOnce() -> T) -> Option<T> {
        let role = ctx.current_role();
        let allowed = self.permits(role);
        trace!(?role, required = ?self.required, allowed, "role gate");
        allowed.then(children)
    }
}
