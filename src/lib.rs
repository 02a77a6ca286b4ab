//! # Gatehouse (session, MFA and role gating)
//!
//! `gatehouse` decides, on every navigation of the dashboard client, whether the
//! current session may see a screen, and if not, where the user goes next and how
//! they come back afterward.
//!
//! ## Gates
//!
//! Three facts resolve asynchronously and are reconciled into one routing decision:
//!
//! - **Session:** is there a bearer token, and does the backend still accept it.
//! - **MFA enrollment:** has the account set up a second factor.
//! - **MFA verification:** has this session presented that factor.
//!
//! The auth gate owns the first fact, the MFA sub-gate the other two. Role gates
//! sit inside already-authenticated screens and only decide visibility of
//! fragments; they never navigate.
//!
//! ## Stores
//!
//! The session and role stores are injected through [`features::auth::state::AuthContext`]
//! and persisted to session-scoped storage. They are caches: every gate decision
//! defers to the latest probe of `/api/authentication/check`. Each token change
//! advances an epoch and results fetched under an older epoch are discarded.

pub mod cli;
pub mod client;
pub mod features;
pub mod routes;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_user_agent() {
        assert!(APP_USER_AGENT.starts_with("gatehouse/"));
    }
}
