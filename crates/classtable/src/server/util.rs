//! Helpers shared by the endpoint handlers.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;
use crate::cache::SessionKey;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// The access token and owner user id of the current session.
pub fn current_session(state: &Arc<AppState>) -> Result<(String, String), Response> {
    match state.auth.get() {
        Some(session) => Ok((session.token, session.user.id)),
        None => Err(ApiErrorType::from((
            StatusCode::UNAUTHORIZED,
            "Not logged in",
            None,
        ))
        .into_response()),
    }
}

/// Owner filter used on every table read and write.
pub fn owner_filter(user_id: &str) -> (&'static str, String) {
    ("user_id", format!("eq.{}", user_id))
}

/// Lists a table's rows for the current session, served from the cache
/// when fresh. Mutations must call `ListCache::invalidate` for the same
/// table.
pub async fn fetch_table_cached(
    state: &Arc<AppState>,
    token: &str,
    user_id: &str,
    table: &str,
) -> Result<Vec<Value>, BackendError> {
    let key = SessionKey::from_token(token);
    if let Some(rows) = state.cache.get(&key, table) {
        return Ok(rows);
    }

    let rows = state
        .backend
        .select::<Value>(token, table, &[owner_filter(user_id)])
        .await?;
    state.cache.insert(key, table, rows.clone());
    Ok(rows)
}

/// Decodes raw rows into a typed shape.
pub fn rows_as<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BackendError> {
    Ok(serde_json::from_value(Value::Array(rows))?)
}

/// Maps a backend error to an HTTP response.
pub fn backend_error_to_response(error: BackendError) -> Response {
    let status = match &error {
        BackendError::Network { .. } => StatusCode::BAD_GATEWAY,
        BackendError::Auth { .. } => StatusCode::BAD_REQUEST,
        BackendError::Api { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        BackendError::Decode { .. }
        | BackendError::UnexpectedResponse { .. }
        | BackendError::UrlError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    ApiErrorType::from((status, "Backend request failed", Some(error.to_string())))
        .into_response()
}
