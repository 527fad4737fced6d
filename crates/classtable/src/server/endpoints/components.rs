//! CRUD endpoints for the component-management console: courses, class
//! groups, classrooms and instructors. Each component is an independent
//! form/list bound to one backend table; there is no cross-entity
//! consistency logic here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};
use tracing::info;

use crate::cache::SessionKey;
use crate::server::types::ApiErrorType;
use crate::server::util::{
    backend_error_to_response, current_session, fetch_table_cached, owner_filter,
};
use crate::types::AppState;

/// The four tabs of the component-management console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Course,
    ClassGroup,
    Classroom,
    Instructor,
}

impl Component {
    /// Parses a path segment like `class-groups` into a component.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "courses" => Some(Component::Course),
            "class-groups" => Some(Component::ClassGroup),
            "classrooms" => Some(Component::Classroom),
            "instructors" => Some(Component::Instructor),
            _ => None,
        }
    }

    /// Backend table this component is bound to.
    pub fn table(self) -> &'static str {
        match self {
            Component::Course => "courses",
            Component::ClassGroup => "class_groups",
            Component::Classroom => "classrooms",
            Component::Instructor => "instructors",
        }
    }

    /// Fields the create form requires to be present and non-empty.
    fn required_fields(self) -> &'static [&'static str] {
        match self {
            Component::Course => &["code", "name"],
            Component::ClassGroup => &["name"],
            Component::Classroom => &["name"],
            Component::Instructor => &["name"],
        }
    }

    /// Optional fields copied through when present.
    fn optional_fields(self) -> &'static [&'static str] {
        match self {
            Component::Classroom => &["location"],
            Component::Instructor => &["email"],
            _ => &[],
        }
    }
}

fn field_as_trimmed(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Builds an insert payload from the request body: required fields must
/// be present and non-empty, optional fields are copied through, the
/// owner user id is attached. Anything else in the body is dropped.
fn build_insert_payload(
    component: Component,
    body: &Value,
    user_id: &str,
) -> Result<Value, String> {
    let mut out = Map::new();
    for field in component.required_fields() {
        match field_as_trimmed(body, field) {
            Some(value) => {
                out.insert(field.to_string(), Value::String(value));
            }
            None => return Err(format!("Missing required field: {}", field)),
        }
    }
    for field in component.optional_fields() {
        if let Some(value) = field_as_trimmed(body, field) {
            out.insert(field.to_string(), Value::String(value));
        }
    }
    out.insert("user_id".to_string(), Value::String(user_id.to_string()));
    Ok(Value::Object(out))
}

/// Builds an update payload: any subset of the component's fields, but
/// a required field present in the body must not be emptied.
fn build_update_payload(component: Component, body: &Value) -> Result<Value, String> {
    let mut out = Map::new();
    for field in component.required_fields() {
        if body.get(field).is_some() {
            match field_as_trimmed(body, field) {
                Some(value) => {
                    out.insert(field.to_string(), Value::String(value));
                }
                None => return Err(format!("Field cannot be empty: {}", field)),
            }
        }
    }
    for field in component.optional_fields() {
        if let Some(raw) = body.get(field) {
            // Optional fields may be cleared with null
            if raw.is_null() {
                out.insert(field.to_string(), Value::Null);
            } else if let Some(value) = field_as_trimmed(body, field) {
                out.insert(field.to_string(), Value::String(value));
            }
        }
    }
    if out.is_empty() {
        return Err("No updatable fields in request".to_string());
    }
    Ok(Value::Object(out))
}

fn parse_component(segment: &str) -> Result<Component, Response> {
    Component::from_path(segment).ok_or_else(|| {
        ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "Unknown component",
            Some(format!("No component named: {}", segment)),
        ))
        .into_response()
    })
}

/// GET /components/:component
pub async fn get_component_list(
    Path(segment): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let component = match parse_component(&segment) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match fetch_table_cached(&s, &token, &user_id, component.table()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

/// POST /components/:component
pub async fn post_component(
    Path(segment): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let component = match parse_component(&segment) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let payload = match build_insert_payload(component, &body, &user_id) {
        Ok(p) => p,
        Err(message) => {
            return ApiErrorType::from((StatusCode::BAD_REQUEST, message.as_str(), None))
                .into_response()
        }
    };

    info!("POST /components/{}", segment);
    match s.backend.insert(&token, component.table(), &payload).await {
        Ok(row) => {
            s.cache
                .invalidate(&SessionKey::from_token(&token), component.table());
            (StatusCode::CREATED, Json(row)).into_response()
        }
        Err(e) => backend_error_to_response(e),
    }
}

/// PATCH /components/:component/:id
pub async fn patch_component(
    Path((segment, id)): Path<(String, String)>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let component = match parse_component(&segment) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let payload = match build_update_payload(component, &body) {
        Ok(p) => p,
        Err(message) => {
            return ApiErrorType::from((StatusCode::BAD_REQUEST, message.as_str(), None))
                .into_response()
        }
    };

    info!("PATCH /components/{}/{}", segment, id);
    let filters = [("id", format!("eq.{}", id)), owner_filter(&user_id)];
    match s
        .backend
        .update(&token, component.table(), &filters, &payload)
        .await
    {
        Ok(()) => {
            s.cache
                .invalidate(&SessionKey::from_token(&token), component.table());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => backend_error_to_response(e),
    }
}

/// DELETE /components/:component/:id
pub async fn delete_component(
    Path((segment, id)): Path<(String, String)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let component = match parse_component(&segment) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    info!("DELETE /components/{}/{}", segment, id);
    let filters = [("id", format!("eq.{}", id)), owner_filter(&user_id)];
    match s
        .backend
        .delete_where(&token, component.table(), &filters)
        .await
    {
        Ok(()) => {
            s.cache
                .invalidate(&SessionKey::from_token(&token), component.table());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => backend_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_from_path() {
        assert_eq!(Component::from_path("courses"), Some(Component::Course));
        assert_eq!(
            Component::from_path("class-groups"),
            Some(Component::ClassGroup)
        );
        assert_eq!(Component::from_path("classrooms"), Some(Component::Classroom));
        assert_eq!(
            Component::from_path("instructors"),
            Some(Component::Instructor)
        );
        assert_eq!(Component::from_path("departments"), None);
    }

    #[test]
    fn test_insert_payload_requires_fields() {
        let err = build_insert_payload(Component::Course, &json!({"name": "Algebra"}), "u1")
            .unwrap_err();
        assert_eq!(err, "Missing required field: code");

        let err =
            build_insert_payload(Component::Course, &json!({"code": "  ", "name": "x"}), "u1")
                .unwrap_err();
        assert_eq!(err, "Missing required field: code");
    }

    #[test]
    fn test_insert_payload_attaches_owner_and_drops_extras() {
        let payload = build_insert_payload(
            Component::Classroom,
            &json!({"name": "Room 1", "location": "East wing", "id": "spoofed"}),
            "u1",
        )
        .expect("valid payload");

        assert_eq!(payload["name"], "Room 1");
        assert_eq!(payload["location"], "East wing");
        assert_eq!(payload["user_id"], "u1");
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn test_update_payload_subset_and_empty_guard() {
        let payload =
            build_update_payload(Component::Instructor, &json!({"email": "a@b.com"})).unwrap();
        assert_eq!(payload["email"], "a@b.com");

        let err = build_update_payload(Component::Instructor, &json!({"name": ""})).unwrap_err();
        assert_eq!(err, "Field cannot be empty: name");

        let err = build_update_payload(Component::ClassGroup, &json!({})).unwrap_err();
        assert_eq!(err, "No updatable fields in request");
    }

    #[test]
    fn test_update_payload_clears_optional_with_null() {
        let payload =
            build_update_payload(Component::Classroom, &json!({"location": null})).unwrap();
        assert!(payload["location"].is_null());
    }
}
