//! JSON request plumbing shared by the auth endpoints. Every request gets the
//! configured timeout, a request id and, when given, a bearer token. Tokens are
//! never logged.

use super::{config::AppConfig, errors::AppError};
use crate::APP_USER_AGENT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use ulid::Ulid;

/// Raw error bodies are cut to this many characters before display.
const MAX_ERROR_CHARS: usize = 200;
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Failure body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    reason: Option<String>,
}

/// Thin wrapper around a `reqwest` client bound to one API base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Builds a client for the configured API base URL.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is empty or the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let base_url = config.api_base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::Config("API base URL is not configured.".to_string()));
        }
        url::Url::parse(base_url)
            .map_err(|err| AppError::Config(format!("Invalid API base URL: {err}")))?;

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            timeout: config.request_timeout,
        })
    }

    /// Fetches JSON, optionally authenticated with a bearer token.
    #[instrument(skip(self, bearer))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<T, AppError> {
        let response = send(self.request(Method::GET, path, bearer)).await?;
        handle_json_response(response).await
    }

    /// Posts JSON and parses a JSON response.
    #[instrument(skip(self, body, bearer))]
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SecretString>,
    ) -> Result<T, AppError> {
        let builder = self.request(Method::POST, path, bearer).json(body);
        let response = send(builder).await?;
        handle_json_response(response).await
    }

    /// Posts JSON and ignores any response body.
    #[instrument(skip(self, body, bearer))]
    pub async fn post_json_empty<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SecretString>,
    ) -> Result<(), AppError> {
        let builder = self.request(Method::POST, path, bearer).json(body);
        let response = send(builder).await?;
        handle_empty_response(response).await
    }

    /// Puts JSON and ignores any response body.
    #[instrument(skip(self, body, bearer))]
    pub async fn put_json_empty<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SecretString>,
    ) -> Result<(), AppError> {
        let builder = self.request(Method::PUT, path, bearer).json(body);
        let response = send(builder).await?;
        handle_empty_response(response).await
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&SecretString>) -> RequestBuilder {
        let url = build_url_with_base(&self.base_url, path);
        let request_id = Ulid::new().to_string();
        debug!(%method, %url, %request_id, "sending request");

        let builder = self
            .http
            .request(method, url)
            .timeout(self.timeout)
            .header(REQUEST_ID_HEADER, request_id);

        match bearer {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into user-facing `AppError` variants with timeout detection.
fn map_request_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, AppError> {
    builder.send().await.map_err(|err| map_request_error(&err))
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(error_from_response(response).await)
    }
}

/// Success means any 2xx; the body is discarded.
async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    http_error(status, &body)
}

/// Prefers the backend's `{error, reason}` body; falls back to the raw text.
fn http_error(status: StatusCode, body: &str) -> AppError {
    let fallback_title = status.canonical_reason().unwrap_or("Request failed").to_string();

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error, reason }) if error.is_some() || reason.is_some() => AppError::Http {
            status: status.as_u16(),
            title: error
                .as_deref()
                .and_then(non_empty)
                .unwrap_or(fallback_title),
            message: reason
                .as_deref()
                .and_then(non_empty)
                .unwrap_or_else(|| "Request failed.".to_string()),
        },
        _ => AppError::Http {
            status: status.as_u16(),
            title: fallback_title,
            message: sanitize_body(body),
        },
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(sanitize_body(trimmed))
    }
}

fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(base_url: &str) -> Result<ApiClient> {
        let config = AppConfig {
            api_base_url: base_url.to_string(),
            ..AppConfig::default()
        };
        Ok(ApiClient::new(&config)?)
    }

    #[test]
    fn build_url_joins_slashes() {
        assert_eq!(
            build_url_with_base("https://api.example.dev/", "/api/authentication/check"),
            "https://api.example.dev/api/authentication/check"
        );
        assert_eq!(build_url_with_base("", "/login"), "/login");
    }

    #[test]
    fn new_rejects_empty_or_invalid_base_url() {
        let config = AppConfig {
            api_base_url: "  ".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(AppError::Config(_))));

        let config = AppConfig {
            api_base_url: "not a url".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn http_error_prefers_backend_body() {
        let err = http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid code","reason":"The code has expired"}"#,
        );
        assert_eq!(
            err,
            AppError::Http {
                status: 400,
                title: "Invalid code".to_string(),
                message: "The code has expired".to_string(),
            }
        );
    }

    #[test]
    fn http_error_falls_back_to_truncated_text() {
        let body = "x".repeat(500);
        let err = http_error(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            AppError::Http {
                status,
                title,
                message,
            } => {
                assert_eq!(status, 500);
                assert_eq!(title, "Internal Server Error");
                assert_eq!(message.len(), MAX_ERROR_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sanitize_body_handles_blank() {
        assert_eq!(sanitize_body("   "), "Request failed.");
    }

    #[tokio::test]
    async fn get_json_sends_bearer_and_request_id() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ping"))
            .and(header("authorization", "Bearer t0ken"))
            .and(header_exists("x-request-id"))
            .and(header("user-agent", APP_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri())?;
        let token = SecretString::from("t0ken".to_string());
        let body: serde_json::Value = client.get_json("/api/ping", Some(&token)).await?;
        assert_eq!(body["ok"], json!(true));
        Ok(())
    }

    #[tokio::test]
    async fn post_json_empty_maps_error_body() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/thing"))
            .and(body_json(json!({ "code": "123456" })))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({ "error": "Rejected", "reason": "Nope" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri())?;
        let err = client
            .post_json_empty("/api/thing", &json!({ "code": "123456" }), None)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.notice().reason, "Nope");
        Ok(())
    }
}
