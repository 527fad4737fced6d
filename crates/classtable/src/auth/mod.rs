//! Auth feature layer.
//!
//! Thin wrappers over the backend auth calls: each operation is one
//! network round trip whose result is reshaped into the view-friendly
//! [`AuthResponse`], with backend error strings rewritten into
//! user-facing copy where known phrases match.

mod session;

pub use session::AuthContext;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{AuthPayload, BackendClient, BackendError, BackendUser};

/// A user as presented to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Result of a successful auth operation: the mapped user plus the
/// session access token (empty string when no session exists yet, e.g.
/// sign-up with email confirmation pending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub token: String,
}

/// A user-facing auth failure. The message is either mapped copy for a
/// known backend phrase or the backend's own message verbatim.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AuthError(pub String);

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const DEFAULT_NAME: &str = "User";

/// Logs in with email and password.
///
/// Backend auth errors are rewritten into friendlier copy by substring
/// matching on known phrases; anything unrecognized becomes the generic
/// "Login failed".
pub async fn login(
    client: &BackendClient,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AuthError> {
    match client.sign_in_with_password(email, password).await {
        Ok(payload) => login_response(payload),
        Err(BackendError::Auth { message }) => Err(AuthError(map_login_error(&message))),
        Err(e) => Err(AuthError(e.to_string())),
    }
}

/// Registers a new user with a display name attribute.
///
/// Backend errors pass through verbatim. A missing session (email
/// confirmation pending) yields an empty-string token, not an error.
pub async fn register(
    client: &BackendClient,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AuthError> {
    match client.sign_up(email, password, name).await {
        Ok(payload) => register_response(payload, name),
        Err(BackendError::Auth { message }) => Err(AuthError(message)),
        Err(e) => Err(AuthError(e.to_string())),
    }
}

/// Asks the backend to resend the sign-up verification email.
pub async fn resend_verification(client: &BackendClient, email: &str) -> Result<(), AuthError> {
    match client.resend_signup_email(email).await {
        Ok(()) => Ok(()),
        Err(BackendError::Auth { message }) => Err(AuthError(message)),
        Err(e) => Err(AuthError(e.to_string())),
    }
}

/// Returns the current user, or `None` when there is no active session
/// or the backend no longer recognizes the token. Never fails for the
/// logged-out case.
pub async fn current_user(client: &BackendClient, ctx: &AuthContext) -> Option<AuthResponse> {
    let session = ctx.get()?;
    match client.get_user(&session.token).await {
        Ok(Some(user)) => Some(AuthResponse {
            user: AuthUser {
                id: user.id.clone(),
                name: display_name(&user),
                email: user.email.unwrap_or_default(),
            },
            token: session.token,
        }),
        _ => None,
    }
}

/// Signs the current session out on the backend and clears the context.
pub async fn logout(client: &BackendClient, ctx: &AuthContext) -> Result<(), AuthError> {
    let session = ctx.get().ok_or_else(|| AuthError("Not logged in".to_string()))?;
    match client.sign_out(&session.token).await {
        Ok(()) => {
            ctx.clear();
            Ok(())
        }
        Err(BackendError::Auth { message }) => Err(AuthError(message)),
        Err(e) => Err(AuthError(e.to_string())),
    }
}

/// Rewrites known backend login error phrases into user-facing copy.
fn map_login_error(message: &str) -> String {
    if message.contains("Invalid login credentials") {
        "Invalid email or password. Please check your credentials and try again.".to_string()
    } else if message.contains("Email not confirmed") || message.contains("Email not verified") {
        "Please verify your email address before logging in. Check your inbox for a verification link."
            .to_string()
    } else if message.contains("Too many requests") {
        "Too many login attempts. Please wait a moment before trying again.".to_string()
    } else if message.contains("User not found") {
        "No account found with this email address. Please check your email or register a new account."
            .to_string()
    } else {
        LOGIN_FAILED.to_string()
    }
}

/// Name fallback chain: metadata name, then the email's local part,
/// then a default literal.
fn display_name(user: &BackendUser) -> String {
    if let Some(name) = user
        .user_metadata
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }
    if let Some(local) = user
        .email
        .as_deref()
        .and_then(|e| e.split('@').next())
        .filter(|l| !l.is_empty())
    {
        return local.to_string();
    }
    DEFAULT_NAME.to_string()
}

/// Maps a sign-in payload; both user and session must be present.
fn login_response(payload: AuthPayload) -> Result<AuthResponse, AuthError> {
    let (user, session) = match (payload.user, payload.session) {
        (Some(user), Some(session)) => (user, session),
        _ => return Err(AuthError(LOGIN_FAILED.to_string())),
    };

    Ok(AuthResponse {
        user: AuthUser {
            id: user.id.clone(),
            name: display_name(&user),
            email: user.email.unwrap_or_default(),
        },
        token: session.access_token,
    })
}

/// Maps a sign-up payload; the user must be present, the session may
/// not be (confirmation pending).
fn register_response(payload: AuthPayload, fallback_name: &str) -> Result<AuthResponse, AuthError> {
    let user = payload
        .user
        .ok_or_else(|| AuthError(REGISTRATION_FAILED.to_string()))?;

    let name = user
        .user_metadata
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name)
        .to_string();

    Ok(AuthResponse {
        user: AuthUser {
            id: user.id.clone(),
            name,
            email: user.email.unwrap_or_default(),
        },
        token: payload
            .session
            .map(|s| s.access_token)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SessionTokens, UserMetadata};

    fn user(id: &str, email: Option<&str>, name: Option<&str>) -> BackendUser {
        BackendUser {
            id: id.to_string(),
            email: email.map(str::to_string),
            user_metadata: UserMetadata {
                name: name.map(str::to_string),
            },
        }
    }

    fn session(token: &str) -> SessionTokens {
        SessionTokens {
            access_token: token.to_string(),
            refresh_token: None,
            expires_in: Some(3600),
        }
    }

    #[test]
    fn test_map_invalid_credentials() {
        let mapped = map_login_error("AuthApiError: Invalid login credentials");
        assert_eq!(
            mapped,
            "Invalid email or password. Please check your credentials and try again."
        );
    }

    #[test]
    fn test_map_known_phrases() {
        assert!(map_login_error("Email not confirmed").contains("verify your email"));
        assert!(map_login_error("Email not verified").contains("verify your email"));
        assert!(map_login_error("Too many requests").contains("Too many login attempts"));
        assert!(map_login_error("User not found").contains("No account found"));
    }

    #[test]
    fn test_map_unknown_phrase_is_generic() {
        assert_eq!(map_login_error("database unavailable"), LOGIN_FAILED);
    }

    #[test]
    fn test_display_name_fallback_chain() {
        assert_eq!(
            display_name(&user("u", Some("a@b.com"), Some("Alice"))),
            "Alice"
        );
        assert_eq!(display_name(&user("u", Some("alice@b.com"), None)), "alice");
        assert_eq!(display_name(&user("u", Some("alice@b.com"), Some(""))), "alice");
        assert_eq!(display_name(&user("u", None, None)), "User");
    }

    #[test]
    fn test_login_response_maps_id_name_token() {
        let payload = AuthPayload {
            user: Some(user("user-1", Some("alice@example.com"), None)),
            session: Some(session("jwt")),
        };
        let resp = login_response(payload).expect("should map");
        assert_eq!(resp.user.id, "user-1");
        assert_eq!(resp.user.name, "alice");
        assert_eq!(resp.token, "jwt");
    }

    #[test]
    fn test_login_response_requires_user_and_session() {
        let missing_session = AuthPayload {
            user: Some(user("u", Some("a@b.com"), None)),
            session: None,
        };
        assert_eq!(login_response(missing_session).unwrap_err().0, LOGIN_FAILED);

        let missing_user = AuthPayload {
            user: None,
            session: Some(session("jwt")),
        };
        assert_eq!(login_response(missing_user).unwrap_err().0, LOGIN_FAILED);
    }

    #[test]
    fn test_register_without_session_yields_empty_token() {
        let payload = AuthPayload {
            user: Some(user("user-2", Some("bob@example.com"), None)),
            session: None,
        };
        let resp = register_response(payload, "Bob").expect("should map");
        assert_eq!(resp.token, "");
        assert_eq!(resp.user.name, "Bob");
    }

    #[tokio::test]
    async fn test_current_user_is_none_without_session() {
        // No session in the context: resolves to None before any
        // backend call is made.
        let client = BackendClient::new(crate::backend::BackendConfig::default())
            .expect("client builds");
        let ctx = AuthContext::new();
        assert!(current_user(&client, &ctx).await.is_none());
    }

    #[test]
    fn test_register_without_user_fails() {
        let payload = AuthPayload {
            user: None,
            session: None,
        };
        assert_eq!(
            register_response(payload, "Bob").unwrap_err().0,
            REGISTRATION_FAILED
        );
    }
}
