//! Login screen.
//!
//! Validates input locally, exchanges credentials for a token, stores it
//! through the auth context and returns the user to where the gate found them.

use super::{intent, Outlet};
use crate::client::{AppConfig, AppError, Notice};
use crate::features::auth::{
    client::AuthApi, guards::AuthGate, guards::Navigator, state::AuthContext,
    types::LoginRequest,
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct LoginScreen<A> {
    ctx: AuthContext,
    api: Arc<A>,
    outlet: Outlet,
    redirect: String,
    email: String,
    password: SecretString,
    notice: Option<Notice>,
}

impl<A: AuthApi + 'static> LoginScreen<A> {
    /// Screen for `/login?<query>`.
    pub fn from_query(
        gate: &AuthGate<A>,
        navigator: Arc<dyn Navigator>,
        config: &AppConfig,
        query: &str,
    ) -> Self {
        Self {
            ctx: gate.context().clone(),
            api: gate.probe().api().clone(),
            outlet: Outlet::new(navigator),
            redirect: intent::redirect_target(query)
                .unwrap_or_else(|| config.default_route.clone()),
            email: String::new(),
            password: SecretString::from(String::new()),
            notice: None,
        }
    }

    #[must_use]
    pub fn redirect_target(&self) -> &str {
        &self.redirect
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: SecretString) {
        self.password = password;
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password_is_empty(&self) -> bool {
        self.password.expose_secret().is_empty()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// # Errors
    /// `AppError::Validation` for bad input (nothing is sent), or whatever the
    /// backend answered. The password is cleared on failure.
    #[instrument(skip_all)]
    pub async fn submit(&mut self) -> Result<(), AppError> {
        self.notice = None;
        let email = self.email.trim().to_string();
        if let Err(err) = validate_credentials(&email, &self.password) {
            self.notice = Some(err.notice());
            return Err(err);
        }

        let request = LoginRequest {
            email,
            password: self.password.clone(),
        };
        match self.api.login(&request).await {
            Ok(token) => {
                self.ctx.sign_in(token);
                info!(to = %self.redirect, "login succeeded");
                self.outlet.go(&self.redirect);
                Ok(())
            }
            Err(err) => {
                self.password = SecretString::from(String::new());
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }
}

impl<A> Drop for LoginScreen<A> {
    fn drop(&mut self) {
        self.outlet.close();
    }
}

/// # Errors
/// `AppError::Validation` describing the first problem found.
pub fn validate_credentials(email: &str, password: &SecretString) -> Result<(), AppError> {
    if email.is_empty() || password.expose_secret().trim().is_empty() {
        return Err(AppError::Validation(
            "Email and password are required.".to_string(),
        ));
    }
    if !valid_email(email) {
        return Err(AppError::Validation(
            "Enter a valid email address.".to_string(),
        ));
    }
    Ok(())
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
