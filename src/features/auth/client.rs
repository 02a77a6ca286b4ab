//! Client wrappers for the authentication API. These helpers centralize
//! endpoints and bearer handling so gates and screens never build requests
//! themselves, and so tests can swap the backend for a fake.

use super::types::{
    DataEnvelope, LoginRequest, LoginResponse, MfaCodeRequest, MfaSetup, PasswordResetRequest,
    User,
};
use crate::client::{ApiClient, AppConfig, AppError};
use secrecy::SecretString;
use std::future::Future;
use tracing::instrument;

pub const CHECK_PATH: &str = "/api/authentication/check";
pub const LOGIN_PATH: &str = "/api/authentication/login";
pub const MFA_VERIFY_PATH: &str = "/api/authentication/mfa/verify";
pub const MFA_SETUP_PATH: &str = "/api/authentication/mfa/setup";
pub const MFA_ENABLE_PATH: &str = "/api/authentication/mfa/enable";
pub const PASSWORD_RESET_PATH: &str = "/api/authentication/password-reset";

/// Backend operations the gates and screens depend on.
pub trait AuthApi: Send + Sync {
    /// Who, if anyone, the token authenticates.
    fn check(
        &self,
        token: &SecretString,
        keep_alive: bool,
    ) -> impl Future<Output = Result<User, AppError>> + Send;

    /// Exchanges credentials for a session token.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<SecretString, AppError>> + Send;

    fn mfa_verify(
        &self,
        token: &SecretString,
        request: &MfaCodeRequest,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn mfa_setup(&self, token: &SecretString)
        -> impl Future<Output = Result<MfaSetup, AppError>> + Send;

    fn mfa_enable(
        &self,
        token: &SecretString,
        request: &MfaCodeRequest,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn password_reset(
        &self,
        request: &PasswordResetRequest,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// `AuthApi` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    client: ApiClient,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns `AppError::Config` if the configured base URL is unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self::new(ApiClient::new(config)?))
    }
}

impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, token))]
    async fn check(&self, token: &SecretString, keep_alive: bool) -> Result<User, AppError> {
        let path = if keep_alive {
            format!("{CHECK_PATH}?keepAlive=true")
        } else {
            CHECK_PATH.to_string()
        };
        let envelope: DataEnvelope<User> = self.client.get_json(&path, Some(token)).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn login(&self, request: &LoginRequest) -> Result<SecretString, AppError> {
        let response: LoginResponse = self.client.post_json(LOGIN_PATH, request, None).await?;
        if response.token.trim().is_empty() {
            return Err(AppError::Parse("Login succeeded without a token.".to_string()));
        }
        Ok(SecretString::from(response.token))
    }

    #[instrument(skip_all)]
    async fn mfa_verify(&self, token: &SecretString, request: &MfaCodeRequest) -> Result<(), AppError> {
        self.client
            .post_json_empty(MFA_VERIFY_PATH, request, Some(token))
            .await
    }

    #[instrument(skip_all)]
    async fn mfa_setup(&self, token: &SecretString) -> Result<MfaSetup, AppError> {
        let envelope: DataEnvelope<MfaSetup> =
            self.client.get_json(MFA_SETUP_PATH, Some(token)).await?;
        Ok(envelope.data)
    }

    #[instrument(skip_all)]
    async fn mfa_enable(&self, token: &SecretString, request: &MfaCodeRequest) -> Result<(), AppError> {
        self.client
            .post_json_empty(MFA_ENABLE_PATH, request, Some(token))
            .await
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    async fn password_reset(&self, request: &PasswordResetRequest) -> Result<(), AppError> {
        self.client
            .put_json_empty(PASSWORD_RESET_PATH, request, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::types::Role;
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn api_for(server: &MockServer) -> Result<HttpAuthApi> {
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        Ok(HttpAuthApi::from_config(&config)?)
    }

    fn token() -> SecretString {
        SecretString::from("session-token".to_string())
    }

    #[tokio::test]
    async fn check_unwraps_data_envelope() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CHECK_PATH))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": 7,
                    "role": "Staff",
                    "mfaEnabled": true,
                    "mfaVerified": true,
                    "email": "staff@example.com"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = api_for(&server)?.check(&token(), false).await?;
        assert_eq!(user.id, "7");
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.email(), Some("staff@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn check_sends_keep_alive_flag() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CHECK_PATH))
            .and(query_param("keepAlive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "u1", "role": "Business" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = api_for(&server)?.check(&token(), true).await?;
        assert_eq!(user.role, Role::Business);
        Ok(())
    }

    #[tokio::test]
    async fn check_surfaces_unauthorized_status() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CHECK_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = api_for(&server)?
            .check(&token(), false)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.is_auth_rejection());
        Ok(())
    }

    #[tokio::test]
    async fn login_returns_token_and_maps_reason() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({ "email": "ok@example.com", "password": "Right123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({ "email": "bad@example.com", "password": "Wrong123" })))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Login failed",
                "reason": "Invalid email or password"
            })))
            .mount(&server)
            .await;

        let api = api_for(&server)?;
        let token = api
            .login(&LoginRequest {
                email: "ok@example.com".to_string(),
                password: SecretString::from("Right123".to_string()),
            })
            .await?;
        assert_eq!(secrecy::ExposeSecret::expose_secret(&token), "fresh");

        let err = api
            .login(&LoginRequest {
                email: "bad@example.com".to_string(),
                password: SecretString::from("Wrong123".to_string()),
            })
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(err.notice().title, "Login failed");
        assert_eq!(err.notice().reason, "Invalid email or password");
        Ok(())
    }

    #[tokio::test]
    async fn mfa_endpoints_use_bearer() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MFA_VERIFY_PATH))
            .and(header("authorization", "Bearer session-token"))
            .and(body_json(json!({ "code": "123456" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(MFA_SETUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "secret": "JBSWY3DP", "otpauthUrl": "otpauth://totp/x" }
            })))
            .mount(&server)
            .await;

        let api = api_for(&server)?;
        api.mfa_verify(
            &token(),
            &MfaCodeRequest {
                code: "123456".to_string(),
            },
        )
        .await?;
        let setup = api.mfa_setup(&token()).await?;
        assert_eq!(setup.secret, "JBSWY3DP");
        assert_eq!(setup.otpauth_url, "otpauth://totp/x");
        Ok(())
    }

    #[tokio::test]
    async fn password_reset_puts_camel_case_body() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(PASSWORD_RESET_PATH))
            .and(body_json(json!({
                "code": "reset-code",
                "password": "Str0ngPass",
                "userId": "u1"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)?
            .password_reset(&PasswordResetRequest {
                code: "reset-code".to_string(),
                password: SecretString::from("Str0ngPass".to_string()),
                user_id: "u1".to_string(),
            })
            .await?;
        Ok(())
    }
}
