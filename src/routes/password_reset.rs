//! Password reset screen: applies a reset code mailed to the user, then sends
//! them to the login screen.

use super::{paths, Outlet};
use crate::client::{AppError, Notice};
use crate::features::auth::{
    client::AuthApi,
    guards::{AuthGate, Navigator},
    types::PasswordResetRequest,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, instrument};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct PasswordResetScreen<A> {
    api: Arc<A>,
    outlet: Outlet,
    notice: Option<Notice>,
    done: bool,
}

impl<A: AuthApi + 'static> PasswordResetScreen<A> {
    pub fn new(gate: &AuthGate<A>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api: gate.probe().api().clone(),
            outlet: Outlet::new(navigator),
            notice: None,
            done: false,
        }
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// # Errors
    /// `AppError::Validation` when the input fails local checks, or the
    /// backend's answer.
    #[instrument(skip(self, code, password, confirmation))]
    pub async fn submit(
        &mut self,
        code: &str,
        password: SecretString,
        confirmation: &SecretString,
        user_id: &str,
    ) -> Result<(), AppError> {
        self.notice = None;
        let code = code.trim();
        let user_id = user_id.trim();
        if let Err(err) = validate_reset(code, &password, confirmation, user_id) {
            self.notice = Some(err.notice());
            return Err(err);
        }

        let request = PasswordResetRequest {
            code: code.to_string(),
            password,
            user_id: user_id.to_string(),
        };
        match self.api.password_reset(&request).await {
            Ok(()) => {
                self.done = true;
                self.notice = Some(Notice::new(
                    "Password updated",
                    "Sign in with your new password.",
                ));
                info!("password reset accepted");
                self.outlet.go(paths::LOGIN);
                Ok(())
            }
            Err(err) => {
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }
}

impl<A> Drop for PasswordResetScreen<A> {
    fn drop(&mut self) {
        self.outlet.close();
    }
}

/// # Errors
/// `AppError::Validation` describing the first problem found.
pub fn validate_reset(
    code: &str,
    password: &SecretString,
    confirmation: &SecretString,
    user_id: &str,
) -> Result<(), AppError> {
    if code.is_empty() || user_id.is_empty() {
        return Err(AppError::Validation(
            "The reset link is incomplete. Request a new one.".to_string(),
        ));
    }
    let password = password.expose_secret();
    if password != confirmation.expose_secret() {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    validate_password_policy(password)
}

/// # Errors
/// `AppError::Validation` unless the password is long enough and mixes upper
/// case, lower case and digits.
pub fn validate_password_policy(password: &str) -> Result<(), AppError> {
    let strong = password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters and include upper case, lower case and a digit."
        )))
    }
}
