//! Middleware that gates protected routes on session presence.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Rejects the request with 401 when no session is active. Handlers
/// behind this layer can assume `current_session` succeeds.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.auth.is_authenticated() {
        next.run(req).await
    } else {
        debug!("Rejecting {} {}: no active session", req.method(), req.uri().path());
        ApiErrorType::from((StatusCode::UNAUTHORIZED, "Not logged in", None)).into_response()
    }
}
