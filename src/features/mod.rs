//! Domain-level features and their shared logic. Routes import these modules so
//! screen code stays focused while session and API handling live here.

pub mod auth;
