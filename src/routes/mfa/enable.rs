//! MFA enrollment screen.
//!
//! Handles authenticator enrollment:
//! 1. Fetch provisioning data (secret + otpauth URL).
//! 2. Confirm the first six-digit code.
//! 3. Invalidate the probe and return to the route that required enrollment.

use super::validate_code;
use crate::client::{AppConfig, AppError, Notice};
use crate::features::auth::{
    client::AuthApi,
    guards::{AuthGate, Navigator},
    probe::AuthProbe,
    state::AuthContext,
    types::{MfaCodeRequest, MfaSetup},
};
use crate::routes::{intent, Outlet};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct MfaEnrollScreen<A> {
    ctx: AuthContext,
    probe: Arc<AuthProbe<A>>,
    outlet: Outlet,
    redirect: String,
    setup: Option<MfaSetup>,
    code: String,
    enrolled: bool,
    notice: Option<Notice>,
}

impl<A: AuthApi + 'static> MfaEnrollScreen<A> {
    /// Screen for `/mfa/enable?<query>`.
    pub fn from_query(
        gate: &AuthGate<A>,
        navigator: Arc<dyn Navigator>,
        config: &AppConfig,
        query: &str,
    ) -> Self {
        Self {
            ctx: gate.context().clone(),
            probe: gate.probe().clone(),
            outlet: Outlet::new(navigator),
            redirect: intent::redirect_target(query)
                .unwrap_or_else(|| config.default_route.clone()),
            setup: None,
            code: String::new(),
            enrolled: false,
            notice: None,
        }
    }

    #[must_use]
    pub fn setup(&self) -> Option<&MfaSetup> {
        self.setup.as_ref()
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn redirect_target(&self) -> &str {
        &self.redirect
    }

    /// Loads the provisioning data to show the user.
    ///
    /// # Errors
    /// Fails without a session or when the backend refuses.
    #[instrument(skip_all)]
    pub async fn begin(&mut self) -> Result<&MfaSetup, AppError> {
        let token = self.token()?;
        match self.probe.api().mfa_setup(&token).await {
            Ok(setup) => Ok(&*self.setup.insert(setup)),
            Err(err) => {
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }

    /// # Errors
    /// `AppError::Validation` for malformed input (nothing is sent), or the
    /// backend's rejection. The code field is cleared on rejection.
    #[instrument(skip_all)]
    pub async fn submit(&mut self) -> Result<(), AppError> {
        if self.enrolled {
            return Ok(());
        }
        self.notice = None;

        let code = match validate_code(&self.code) {
            Ok(code) => code,
            Err(err) => {
                self.notice = Some(err.notice());
                return Err(err);
            }
        };
        let token = self.token()?;

        match self
            .probe
            .api()
            .mfa_enable(&token, &MfaCodeRequest { code })
            .await
        {
            Ok(()) => {
                self.enrolled = true;
                self.probe.invalidate();
                info!(to = %self.redirect, "mfa enrolled");
                self.outlet.go(&self.redirect);
                Ok(())
            }
            Err(err) => {
                warn!("mfa enrollment rejected: {err}");
                self.code.clear();
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }

    fn token(&mut self) -> Result<SecretString, AppError> {
        self.ctx.session().token().ok_or_else(|| {
            let err = AppError::Validation("Your session has expired. Sign in again.".to_string());
            self.notice = Some(err.notice());
            err
        })
    }
}

impl<A> Drop for MfaEnrollScreen<A> {
    fn drop(&mut self) {
        self.outlet.close();
    }
}
