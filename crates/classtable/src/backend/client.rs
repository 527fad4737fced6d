//! HTTP client for the hosted database-plus-auth backend.
//!
//! Auth calls go to `/auth/v1/...` (password grant, sign-up, resend,
//! get-user, sign-out); table reads and writes go to `/rest/v1/<table>`
//! using the backend's filter syntax (`column=eq.value`). Every call is
//! a single round trip: success or an error, no retry.

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use super::config::BackendConfig;
use super::error::BackendError;
use super::types::{AuthPayload, BackendUser, SessionTokens};

/// Path prefix for the auth service.
const AUTH_PATH: &str = "/auth/v1";
/// Path prefix for the table REST layer.
const REST_PATH: &str = "/rest/v1";

/// Client for the hosted backend. Cheap to clone is not needed; it is
/// shared behind the application state `Arc`.
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Creates a new backend client, validating the configured base URL.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        Url::parse(&config.base_url)?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let mut config = config;
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }

        Ok(Self { http, config })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.config.base_url, AUTH_PATH, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.config.base_url, REST_PATH, table)
    }

    // ------------------------------------------------------------------
    // Auth service
    // ------------------------------------------------------------------

    /// Signs in with email and password via the password grant.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Signing in via password grant");

        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        self.read_auth_payload(response, &correlation_id).await
    }

    /// Signs up a new user, attaching `name` as a metadata attribute.
    ///
    /// When email confirmation is enabled on the backend, the response
    /// carries a user but no session.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthPayload, BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Signing up new user");

        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        self.read_auth_payload(response, &correlation_id).await
    }

    /// Asks the backend to resend the sign-up verification email.
    pub async fn resend_signup_email(&self, email: &str) -> Result<(), BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Resending verification email");

        let response = self
            .http
            .post(self.auth_url("resend"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "type": "signup", "email": email }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Auth {
                message: extract_error_message(status, &body),
            })
        }
    }

    /// Fetches the user behind an access token.
    ///
    /// Returns `Ok(None)` when the backend reports the token as not
    /// belonging to an authenticated user (expired or revoked).
    pub async fn get_user(&self, access_token: &str) -> Result<Option<BackendUser>, BackendError> {
        let correlation_id = generate_correlation_id();
        debug!(correlation_id = %correlation_id, "Fetching current user");

        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user = response.json::<BackendUser>().await?;
                Ok(Some(user))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(BackendError::Auth {
                    message: extract_error_message(status, &body),
                })
            }
        }
    }

    /// Signs out the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, "Signing out");

        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Auth {
                message: extract_error_message(status, &body),
            })
        }
    }

    async fn read_auth_payload(
        &self,
        response: reqwest::Response,
        correlation_id: &str,
    ) -> Result<AuthPayload, BackendError> {
        let status = response.status();
        if status.is_success() {
            let body = response.json::<Value>().await?;
            let payload = parse_auth_payload(&body);
            debug!(
                correlation_id = %correlation_id,
                has_user = payload.user.is_some(),
                has_session = payload.session.is_some(),
                "Auth call succeeded"
            );
            Ok(payload)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body);
            error!(correlation_id = %correlation_id, status = %status, "Auth call failed: {}", message);
            Err(BackendError::Auth { message })
        }
    }

    // ------------------------------------------------------------------
    // Table REST layer
    // ------------------------------------------------------------------

    /// Selects rows from a table. Filters use the backend's operator
    /// syntax, e.g. `("user_id", "eq.<uuid>")`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let correlation_id = generate_correlation_id();
        debug!(correlation_id = %correlation_id, table = table, "Selecting rows");

        let response = self
            .http
            .get(self.rest_url(table))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .query(filters)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json::<Vec<T>>().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(rest_error(status, &body))
        }
    }

    /// Inserts one row and returns the created representation.
    pub async fn insert<B: Serialize>(
        &self,
        access_token: &str,
        table: &str,
        body: &B,
    ) -> Result<Value, BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, table = table, "Inserting row");

        let response = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.config.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let mut rows = response.json::<Vec<Value>>().await?;
            if rows.is_empty() {
                return Err(BackendError::UnexpectedResponse {
                    message: format!("insert into {} returned no representation", table),
                });
            }
            Ok(rows.remove(0))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(rest_error(status, &body))
        }
    }

    /// Updates rows matching the filters.
    pub async fn update<B: Serialize>(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<(), BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, table = table, "Updating rows");

        let response = self
            .http
            .patch(self.rest_url(table))
            .query(filters)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(rest_error(status, &body))
        }
    }

    /// Deletes rows matching the filters.
    pub async fn delete_where(
        &self,
        access_token: &str,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<(), BackendError> {
        let correlation_id = generate_correlation_id();
        info!(correlation_id = %correlation_id, table = table, "Deleting rows");

        let response = self
            .http
            .delete(self.rest_url(table))
            .query(filters)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(rest_error(status, &body))
        }
    }
}

/// Normalizes an auth success body into user + session.
///
/// Sign-in answers with a session object (`access_token` at the top
/// level, user nested); sign-up with confirmation pending answers with
/// the bare user object.
pub(crate) fn parse_auth_payload(body: &Value) -> AuthPayload {
    if body.get("access_token").is_some() {
        let session = SessionTokens {
            access_token: body
                .get("access_token")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            refresh_token: body
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_string),
            expires_in: body.get("expires_in").and_then(Value::as_i64),
        };
        let user = body
            .get("user")
            .and_then(|u| serde_json::from_value::<BackendUser>(u.clone()).ok());
        AuthPayload {
            user,
            session: Some(session),
        }
    } else if body.get("id").is_some() {
        let user = serde_json::from_value::<BackendUser>(body.clone()).ok();
        AuthPayload {
            user,
            session: None,
        }
    } else {
        AuthPayload {
            user: None,
            session: None,
        }
    }
}

/// Pulls the human-readable message out of an auth error body.
///
/// The auth service is inconsistent about the field name across
/// endpoints, so several are tried before falling back to the raw body.
pub(crate) fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["error_description", "msg", "message", "error"] {
            if let Some(message) = value.get(field).and_then(Value::as_str) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    if body.trim().is_empty() {
        format!("Request failed with status {}", status)
    } else {
        body.trim().to_string()
    }
}

fn rest_error(status: StatusCode, body: &str) -> BackendError {
    BackendError::Api {
        status: status.as_u16(),
        message: extract_error_message(status, body),
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_with_session() {
        let body = json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {
                "id": "user-1",
                "email": "alice@example.com",
                "user_metadata": { "name": "Alice" }
            }
        });

        let payload = parse_auth_payload(&body);
        let session = payload.session.expect("session should be present");
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.expires_in, Some(3600));
        let user = payload.user.expect("user should be present");
        assert_eq!(user.id, "user-1");
        assert_eq!(user.user_metadata.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_parse_payload_bare_user() {
        // Sign-up with confirmation pending answers with the user only.
        let body = json!({
            "id": "user-2",
            "email": "bob@example.com",
            "user_metadata": {}
        });

        let payload = parse_auth_payload(&body);
        assert!(payload.session.is_none());
        assert_eq!(payload.user.expect("user").id, "user-2");
    }

    #[test]
    fn test_parse_payload_empty_body() {
        let payload = parse_auth_payload(&json!({}));
        assert!(payload.user.is_none());
        assert!(payload.session.is_none());
    }

    #[test]
    fn test_extract_error_message_fields() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(status, r#"{"error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            extract_error_message(status, r#"{"msg":"Email not confirmed"}"#),
            "Email not confirmed"
        );
        assert_eq!(
            extract_error_message(status, r#"{"message":"User not found"}"#),
            "User not found"
        );
    }

    #[test]
    fn test_extract_error_message_fallbacks() {
        let status = StatusCode::TOO_MANY_REQUESTS;
        assert_eq!(
            extract_error_message(status, "Too many requests"),
            "Too many requests"
        );
        assert_eq!(
            extract_error_message(status, ""),
            "Request failed with status 429 Too Many Requests"
        );
    }
}
