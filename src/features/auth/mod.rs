//! Auth feature module covering session hydration, the shared authentication
//! probe and the gates built on it. It keeps authentication logic out of the
//! screens and must stay aligned with backend expectations. This module touches
//! security boundaries and must avoid logging secrets or token material.
//!
//! Flow Overview: A gate snapshots the session token and its epoch, asks the
//! probe who the token belongs to, then applies the answer through the
//! [`state::AuthContext`] only if the epoch has not moved. The MFA sub-gate
//! and role gates read what that step stored.

pub mod client;
pub mod guards;
pub mod probe;
pub mod role;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;

pub use client::{AuthApi, HttpAuthApi};
pub use probe::{AuthProbe, ProbeOutcome, RetryPolicy};
pub use session::Epoch;
pub use state::AuthContext;
pub use types::{Role, User};
