//! Auth endpoints: login, registration, verification resend, current
//! user, logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::auth;
use crate::auth::AuthResponse;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// GET /login
///
/// The login route itself; the redirect contract sends unauthenticated
/// users here. Serves a minimal status payload.
pub async fn get_login(State(s): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "authenticated": s.auth.is_authenticated() })),
    )
        .into_response()
}

/// POST /auth/login
pub async fn post_login(
    State(s): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Email and password are required",
            None,
        ))
        .into_response();
    }

    info!("POST /auth/login for {}", body.email);
    match auth::login(&s.backend, &body.email, &body.password).await {
        Ok(resp) => {
            s.auth.set(resp.clone());
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            error!("Login failed for {}: {}", body.email, e);
            ApiErrorType::from((StatusCode::UNAUTHORIZED, e.0.as_str(), None)).into_response()
        }
    }
}

/// POST /auth/register
pub async fn post_register(
    State(s): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Name, email and password are required",
            None,
        ))
        .into_response();
    }

    info!("POST /auth/register for {}", body.email);
    match auth::register(&s.backend, &body.name, &body.email, &body.password).await {
        Ok(resp) => {
            // An empty token means email confirmation is pending; the
            // session only becomes current once one exists.
            if !resp.token.is_empty() {
                s.auth.set(resp.clone());
            }
            (StatusCode::CREATED, Json(resp)).into_response()
        }
        Err(e) => {
            error!("Registration failed for {}: {}", body.email, e);
            ApiErrorType::from((StatusCode::BAD_REQUEST, e.0.as_str(), None)).into_response()
        }
    }
}

/// POST /auth/resend-verification
pub async fn post_resend_verification(
    State(s): State<Arc<AppState>>,
    Json(body): Json<ResendRequest>,
) -> Response {
    if body.email.trim().is_empty() {
        return ApiErrorType::from((StatusCode::BAD_REQUEST, "Email is required", None))
            .into_response();
    }

    match auth::resend_verification(&s.backend, &body.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Verification email sent" })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from((StatusCode::BAD_REQUEST, e.0.as_str(), None)).into_response(),
    }
}

/// GET /auth/me
///
/// Always 200; the body is the mapped session or `null` when logged
/// out. This route is deliberately outside the session middleware.
pub async fn get_me(State(s): State<Arc<AppState>>) -> Json<Option<AuthResponse>> {
    Json(auth::current_user(&s.backend, &s.auth).await)
}

/// POST /auth/logout
pub async fn post_logout(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /auth/logout");
    match auth::logout(&s.backend, &s.auth).await {
        Ok(()) => {
            s.cache.clear();
            (StatusCode::OK, Json(json!({ "message": "Logged out" }))).into_response()
        }
        Err(e) => ApiErrorType::from((StatusCode::BAD_REQUEST, e.0.as_str(), None)).into_response(),
    }
}
