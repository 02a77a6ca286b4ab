//! Second-factor policy for a resolved user: whether the gate must send them
//! to enrollment or verification before protected content is shown.

use crate::features::auth::types::User;
use crate::routes::{intent, paths};

/// What a resolved user still owes before protected content is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MfaRequirement {
    /// No authenticator enrolled yet.
    Enrollment,
    /// Enrolled, but not verified for this session.
    Verification,
    Satisfied,
}

impl MfaRequirement {
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        match (user.mfa_enabled, user.mfa_verified) {
            (false, _) => Self::Enrollment,
            (true, false) => Self::Verification,
            (true, true) => Self::Satisfied,
        }
    }

    /// Screen that settles this requirement.
    #[must_use]
    pub fn route(self) -> Option<&'static str> {
        match self {
            Self::Enrollment => Some(paths::MFA_ENABLE),
            Self::Verification => Some(paths::MFA_VERIFY),
            Self::Satisfied => None,
        }
    }

    /// Where to send someone who was trying to reach `from`.
    #[must_use]
    pub fn redirect_from(self, from: &str) -> Option<String> {
        self.route().map(|route| intent::with_redirect(route, from))
    }
}
