//! Client routes: the screens the gates send users to and the navigation
//! intent they carry. Screens are headless state machines; the CLI and tests
//! drive them and observe the resulting navigation.

pub mod intent;
pub mod login;
pub mod mfa;
pub mod password_reset;

pub use login::LoginScreen;
pub use mfa::{MfaEnrollScreen, MfaVerifyScreen};
pub use password_reset::PasswordResetScreen;

use crate::features::auth::guards::{Navigator, Scope};
use std::sync::Arc;

pub mod paths {
    pub const DASHBOARD: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const MFA_ENABLE: &str = "/mfa/enable";
    pub const MFA_VERIFY: &str = "/mfa/verify";
    pub const PASSWORD_RESET: &str = "/password-reset";
}

/// Navigation owned by a screen. Closed when the screen goes away.
#[derive(Clone)]
pub(crate) struct Outlet {
    navigator: Arc<dyn Navigator>,
    scope: Scope,
}

impl Outlet {
    pub(crate) fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            scope: Scope::new(),
        }
    }

    /// Navigates unless the screen is gone. Returns whether it did.
    pub(crate) fn go(&self, location: &str) -> bool {
        self.scope.navigate(self.navigator.as_ref(), location)
    }

    pub(crate) fn close(&self) {
        self.scope.close();
    }
}
