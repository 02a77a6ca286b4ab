//! MFA screens: verification of an enrolled authenticator and first-time
//! enrollment. Both sit behind a session-only gate and accept six-digit codes.

mod enable;
mod verify;

pub use enable::MfaEnrollScreen;
pub use verify::{MfaVerifyScreen, VerifyState};

use crate::client::AppError;
use regex::Regex;

/// Checks an authenticator code before anything is sent.
///
/// # Errors
/// `AppError::Validation` unless the input is exactly six ASCII digits.
pub fn validate_code(input: &str) -> Result<String, AppError> {
    let code = input.trim();
    if Regex::new(r"^[0-9]{6}$").is_ok_and(|re| re.is_match(code)) {
        Ok(code.to_string())
    } else {
        Err(AppError::Validation(
            "Enter the 6-digit code from your authenticator app.".to_string(),
        ))
    }
}
