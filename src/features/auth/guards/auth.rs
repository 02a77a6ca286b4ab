//! Auth gate: decides whether the current session may see a route.
//!
//! Flow Overview:
//! 1) Snapshot the token and its epoch. No token settles as unauthenticated
//!    without any request.
//! 2) Ask the shared probe. While it is in flight the gate reports `Checking`
//!    and never redirects.
//! 3) Apply the outcome only if the epoch is unchanged; otherwise start over
//!    with the new token. A refused token is cleared; an unreachable backend
//!    leaves the session alone and the gate stays on its loading view.
//! 4) A mounted gate then waits for the next token change and repeats.
//!
//! Store writes go through the mount's [`Scope`] and navigation checks it, so
//! nothing happens once the [`MountedGate`] is dropped. The navigator may drop
//! the gate itself.

use super::{mfa::MfaRequirement, GateView, Navigator, Scope};
use crate::features::auth::{
    client::AuthApi,
    probe::{AuthProbe, ProbeOutcome},
    session::Epoch,
    state::AuthContext,
    types::User,
};
use crate::routes::intent;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, instrument, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum AuthStatus {
    Checking,
    Authenticated(User),
    Unauthenticated,
    /// The backend could not be asked. The token is kept and nothing
    /// redirects; the next mount or token change asks again.
    Unavailable,
}

impl AuthStatus {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// What a route demands beyond a valid session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protection {
    /// Session only. Used by the MFA screens themselves.
    SessionOnly,
    /// Session plus an enrolled and verified second factor.
    Full,
}

pub struct AuthGate<A> {
    ctx: AuthContext,
    probe: Arc<AuthProbe<A>>,
}

impl<A> Clone for AuthGate<A> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            probe: self.probe.clone(),
        }
    }
}

impl<A: AuthApi + 'static> AuthGate<A> {
    #[must_use]
    pub fn new(ctx: AuthContext, probe: Arc<AuthProbe<A>>) -> Self {
        Self { ctx, probe }
    }

    #[must_use]
    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }

    #[must_use]
    pub fn probe(&self) -> &Arc<AuthProbe<A>> {
        &self.probe
    }

    /// Resolves the session once, applying the outcome to the stores.
    pub async fn resolve(&self) -> AuthStatus {
        match self.resolve_in(&Scope::new()).await {
            Some((status, _)) => status,
            None => AuthStatus::Unauthenticated,
        }
    }

    /// Starts gating `path`. The returned handle reports `Checking` until the
    /// first answer arrives and keeps following token changes until dropped.
    pub fn mount(
        &self,
        path: impl Into<String>,
        protection: Protection,
        navigator: Arc<dyn Navigator>,
    ) -> MountedGate {
        let path = path.into();
        let scope = Scope::new();
        let (status_tx, status_rx) = watch::channel(Settled {
            status: AuthStatus::Checking,
            epoch: self.ctx.session().epoch(),
        });

        let task = tokio::spawn(self.clone().run(Mount {
            path: path.clone(),
            protection,
            navigator,
            scope: scope.clone(),
            status: status_tx,
        }));

        MountedGate {
            ctx: self.ctx.clone(),
            path,
            protection,
            scope,
            status: status_rx,
            task,
        }
    }

    async fn run(self, mount: Mount) {
        let mut epochs = self.ctx.session().subscribe();
        loop {
            let Some((resolved, epoch)) = self.resolve_in(&mount.scope).await else {
                return;
            };
            match mount.settle(&self.ctx, resolved, epoch) {
                None => return,
                Some(false) => {
                    debug!(epoch = epoch.value(), "session changed before settling");
                    continue;
                }
                Some(true) => {}
            }

            if epochs.wait_for(|current| *current != epoch).await.is_err() {
                return;
            }
            if !mount.restart(self.ctx.session().epoch()) {
                return;
            }
        }
    }

    /// `None` once `scope` is closed.
    #[instrument(skip_all)]
    async fn resolve_in(&self, scope: &Scope) -> Option<(AuthStatus, Epoch)> {
        loop {
            let (token, epoch) = self.ctx.session().snapshot();
            let Some(token) = token else {
                debug!(epoch = epoch.value(), "no session token");
                return Some((AuthStatus::Unauthenticated, epoch));
            };

            match self.probe.fetch(epoch, &token).await {
                ProbeOutcome::Authenticated(user) => {
                    if scope.apply(|| self.ctx.apply_user(epoch, &user))? {
                        return Some((AuthStatus::Authenticated(user), epoch));
                    }
                }
                ProbeOutcome::Rejected { status } => {
                    if let Some(cleared) = scope.apply(|| self.ctx.reject(epoch))? {
                        debug!(status, "session cleared after rejection");
                        return Some((AuthStatus::Unauthenticated, cleared));
                    }
                }
                ProbeOutcome::Failed(err) => {
                    if self.ctx.session().epoch() == epoch {
                        warn!("session check gave up, keeping token: {err}");
                        return Some((AuthStatus::Unavailable, epoch));
                    }
                }
            }
            debug!(epoch = epoch.value(), "session changed during check");
        }
    }
}

#[derive(Clone, Debug)]
struct Settled {
    status: AuthStatus,
    epoch: Epoch,
}

/// Everything a mounted gate's task owns.
struct Mount {
    path: String,
    protection: Protection,
    navigator: Arc<dyn Navigator>,
    scope: Scope,
    status: watch::Sender<Settled>,
}

impl Mount {
    /// Publishes `resolved` and follows its redirect. `None` once the scope is
    /// closed, `Some(false)` if the session moved past `epoch` first.
    fn settle(&self, ctx: &AuthContext, resolved: AuthStatus, epoch: Epoch) -> Option<bool> {
        let current = || ctx.session().epoch() == epoch;
        let target = redirect_for(&resolved, &self.path, self.protection);

        let published = self.scope.apply(|| {
            if !current() {
                return false;
            }
            self.status.send_replace(Settled {
                status: resolved,
                epoch,
            });
            true
        })?;
        if !published {
            return Some(false);
        }

        if let Some(target) = target {
            // Outside the scope lock: navigating may drop this gate.
            if current() && self.scope.navigate(self.navigator.as_ref(), &target) {
                info!(from = %self.path, to = %target, "redirected");
            }
        }
        Some(true)
    }

    fn restart(&self, epoch: Epoch) -> bool {
        self.scope
            .apply(|| {
                self.status.send_replace(Settled {
                    status: AuthStatus::Checking,
                    epoch,
                });
            })
            .is_some()
    }
}

/// A gate attached to one route. Dropping it cancels everything it started.
pub struct MountedGate {
    ctx: AuthContext,
    path: String,
    protection: Protection,
    scope: Scope,
    status: watch::Receiver<Settled>,
    task: JoinHandle<()>,
}

impl MountedGate {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current status. A result settled for an older token reads as `Checking`.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        let settled = self.status.borrow();
        if settled.epoch == self.ctx.session().epoch() {
            settled.status.clone()
        } else {
            AuthStatus::Checking
        }
    }

    #[must_use]
    pub fn view(&self) -> GateView {
        let status = self.status();
        if let Some(target) = redirect_for(&status, &self.path, self.protection) {
            return GateView::Redirect(target);
        }
        match status {
            AuthStatus::Authenticated(user) => GateView::Content(user),
            AuthStatus::Checking | AuthStatus::Unauthenticated | AuthStatus::Unavailable => {
                GateView::Loading
            }
        }
    }

    /// Waits until the gate has settled for the current token.
    pub async fn settled(&self) -> AuthStatus {
        let mut status = self.status.clone();
        let ctx = self.ctx.clone();
        let _ = status
            .wait_for(|settled| {
                !matches!(settled.status, AuthStatus::Checking)
                    && settled.epoch == ctx.session().epoch()
            })
            .await;
        self.status()
    }
}

impl Drop for MountedGate {
    fn drop(&mut self) {
        self.scope.close();
        self.task.abort();
    }
}

fn redirect_for(status: &AuthStatus, path: &str, protection: Protection) -> Option<String> {
    match (status, protection) {
        (AuthStatus::Checking | AuthStatus::Unavailable, _)
        | (AuthStatus::Authenticated(_), Protection::SessionOnly) => None,
        (AuthStatus::Unauthenticated, _) => Some(intent::login_location(path)),
        (AuthStatus::Authenticated(user), Protection::Full) => {
            MfaRequirement::for_user(user).redirect_from(path)
        }
    }
}
