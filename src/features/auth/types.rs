//! Request and response types for auth-related API calls. Passwords travel as
//! `SecretString` and are only exposed while serializing the request body.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

/// Coarse permission tier attached to a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "System Admin")]
    SystemAdmin,
    Staff,
    Business,
    Collector,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemAdmin => "System Admin",
            Self::Staff => "Staff",
            Self::Business => "Business",
            Self::Collector => "Collector",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "system admin" | "systemadmin" | "admin" => Ok(Self::SystemAdmin),
            "staff" => Ok(Self::Staff),
            "business" => Ok(Self::Business),
            "collector" => Ok(Self::Collector),
            _ => Err(format!("unknown role: {value}")),
        }
    }
}

/// The authenticated account as reported by `/api/authentication/check`.
/// Only meaningful together with the session epoch that fetched it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub mfa_verified: bool,
    /// Remaining profile fields (name, email, ...), kept as sent.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.profile.get("email").and_then(Value::as_str)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// `{ data: T }` wrapper used by the backend for read endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MfaCodeRequest {
    pub code: String,
}

/// Provisioning data for authenticator enrollment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaSetup {
    pub secret: String,
    pub otpauth_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub code: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_uses_display_names_on_the_wire() {
        assert_eq!(
            serde_json::to_value(Role::SystemAdmin).ok(),
            Some(json!("System Admin"))
        );
        let role: Role = serde_json::from_value(json!("Collector")).unwrap();
        assert_eq!(role, Role::Collector);
        assert!(serde_json::from_value::<Role>(json!("Root")).is_err());
    }

    #[test]
    fn role_from_str_is_forgiving() {
        assert_eq!("system-admin".parse::<Role>(), Ok(Role::SystemAdmin));
        assert_eq!(" Staff ".parse::<Role>(), Ok(Role::Staff));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn user_accepts_numeric_id_and_keeps_profile() {
        let user: User = serde_json::from_value(json!({
            "id": 42,
            "role": "Business",
            "mfaEnabled": true,
            "mfaVerified": false,
            "email": "owner@example.com",
            "name": "Owner"
        }))
        .unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.role, Role::Business);
        assert!(user.mfa_enabled);
        assert!(!user.mfa_verified);
        assert_eq!(user.email(), Some("owner@example.com"));
        assert_eq!(user.profile.get("name"), Some(&json!("Owner")));
    }

    #[test]
    fn user_defaults_missing_mfa_flags_to_false() {
        let user: User = serde_json::from_value(json!({ "id": "u1", "role": "Staff" })).unwrap();
        assert!(!user.mfa_enabled);
        assert!(!user.mfa_verified);
    }

    #[test]
    fn password_reset_serializes_camel_case_and_exposes_password() {
        let request = PasswordResetRequest {
            code: "abc".to_string(),
            password: SecretString::from("Secret123".to_string()),
            user_id: "u1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "code": "abc", "password": "Secret123", "userId": "u1" })
        );
    }

    #[test]
    fn login_request_debug_redacts_password() {
        let request = LoginRequest {
            email: "a@b.co".to_string(),
            password: SecretString::from("hunter2".to_string()),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
