//! MFA verification screen.
//!
//! Handles the per-session second factor:
//! 1. Collect a six-digit code and reject malformed input locally.
//! 2. Submit it with the session token.
//! 3. On success, invalidate the probe, confirm, and after a short delay
//!    return to the route the gate interrupted.
//! 4. On rejection, show the backend's reason and clear the field.

use super::validate_code;
use crate::client::{AppConfig, AppError, Notice};
use crate::features::auth::{
    client::AuthApi,
    guards::{AuthGate, Navigator},
    probe::AuthProbe,
    state::AuthContext,
    types::MfaCodeRequest,
};
use crate::routes::{intent, Outlet};
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{info, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyState {
    EnteringCode,
    Submitting,
    Verified,
}

pub struct MfaVerifyScreen<A> {
    ctx: AuthContext,
    probe: Arc<AuthProbe<A>>,
    outlet: Outlet,
    redirect: String,
    confirm_delay: Duration,
    state: VerifyState,
    code: String,
    notice: Option<Notice>,
    pending: Option<JoinHandle<()>>,
}

impl<A: AuthApi + 'static> MfaVerifyScreen<A> {
    /// Screen for `/mfa/verify?<query>`.
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
            confirm_delay: config.confirm_delay,
            state: VerifyState::EnteringCode,
            code: String::new(),
            notice: None,
            pending: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> VerifyState {
        self.state
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn redirect_target(&self) -> &str {
        &self.redirect
    }

    /// # Errors
    /// `AppError::Validation` for malformed input (nothing is sent), or the
    /// backend's rejection.
    #[instrument(skip_all)]
    pub async fn submit(&mut self) -> Result<(), AppError> {
        if self.state == VerifyState::Verified {
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
        let Some(token) = self.ctx.session().token() else {
            let err = AppError::Validation("Your session has expired. Sign in again.".to_string());
            self.notice = Some(err.notice());
            return Err(err);
        };

        let result = {
            let _submitting = Submitting::enter(&mut self.state);
            self.probe
                .api()
                .mfa_verify(&token, &MfaCodeRequest { code })
                .await
        };
        match result {
            Ok(()) => {
                self.state = VerifyState::Verified;
                self.probe.invalidate();
                self.notice = Some(Notice::new("Verified", "Two-factor verification complete."));
                info!(to = %self.redirect, "mfa verified");
                self.schedule_redirect();
                Ok(())
            }
            Err(err) => {
                warn!("mfa verification rejected: {err}");
                self.state = VerifyState::EnteringCode;
                self.code.clear();
                self.notice = Some(err.notice());
                Err(err)
            }
        }
    }

    /// Waits for the deferred navigation, if one is scheduled.
    pub async fn finished(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.await;
        }
    }

    fn schedule_redirect(&mut self) {
        let outlet = self.outlet.clone();
        let target = self.redirect.clone();
        let delay = self.confirm_delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            outlet.go(&target);
        }));
    }
}

/// Holds `Submitting` while the request is in flight and falls back to
/// `EnteringCode` when it ends or its future is dropped.
struct Submitting<'a>(&'a mut VerifyState);

impl<'a> Submitting<'a> {
    fn enter(state: &'a mut VerifyState) -> Self {
        *state = VerifyState::Submitting;
        Self(state)
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        *self.0 = VerifyState::EnteringCode;
    }
}

impl<A> Drop for MfaVerifyScreen<A> {
    fn drop(&mut self) {
        self.outlet.close();
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
