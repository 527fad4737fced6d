//! Class-session endpoints.
//!
//! The list view is the session rows joined in-process with the four
//! component tables into a view-friendly shape, the same mapping the
//! original front end performed after fetching.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::try_join;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::backend::{
    ClassGroupRow, ClassSessionRow, ClassroomRow, CourseRow, InstructorRow,
};
use crate::cache::SessionKey;
use crate::server::types::ApiErrorType;
use crate::server::util::{
    backend_error_to_response, current_session, fetch_table_cached, owner_filter, rows_as,
};
use crate::types::AppState;

/// A referenced component reduced to what the list view shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// A referenced course; the view shows its code alongside the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: String,
    pub code: String,
    pub name: String,
}

/// A class session with its foreign keys resolved to display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSessionView {
    pub id: String,
    pub course: CourseRef,
    pub group: NamedRef,
    pub classroom: NamedRef,
    pub instructor: NamedRef,
}

#[derive(Debug, Deserialize)]
pub struct SessionCreateRequest {
    pub course_id: String,
    pub class_group_id: String,
    pub classroom_id: String,
    pub instructor_id: String,
}

/// Resolves session rows against the component tables. A dangling
/// foreign key (ruled out by the backend's referential integrity, but
/// not by this code) resolves to an empty name.
pub(crate) fn build_session_views(
    sessions: &[ClassSessionRow],
    courses: &[CourseRow],
    groups: &[ClassGroupRow],
    classrooms: &[ClassroomRow],
    instructors: &[InstructorRow],
) -> Vec<ClassSessionView> {
    let courses: HashMap<&str, &CourseRow> =
        courses.iter().map(|c| (c.id.as_str(), c)).collect();
    let groups: HashMap<&str, &ClassGroupRow> =
        groups.iter().map(|g| (g.id.as_str(), g)).collect();
    let classrooms: HashMap<&str, &ClassroomRow> =
        classrooms.iter().map(|r| (r.id.as_str(), r)).collect();
    let instructors: HashMap<&str, &InstructorRow> =
        instructors.iter().map(|i| (i.id.as_str(), i)).collect();

    sessions
        .iter()
        .map(|session| ClassSessionView {
            id: session.id.clone(),
            course: courses
                .get(session.course_id.as_str())
                .map(|c| CourseRef {
                    id: c.id.clone(),
                    code: c.code.clone(),
                    name: c.name.clone(),
                })
                .unwrap_or_else(|| CourseRef {
                    id: session.course_id.clone(),
                    code: String::new(),
                    name: String::new(),
                }),
            group: named_ref(&session.class_group_id, groups.get(session.class_group_id.as_str()).map(|g| g.name.as_str())),
            classroom: named_ref(&session.classroom_id, classrooms.get(session.classroom_id.as_str()).map(|r| r.name.as_str())),
            instructor: named_ref(&session.instructor_id, instructors.get(session.instructor_id.as_str()).map(|i| i.name.as_str())),
        })
        .collect()
}

fn named_ref(id: &str, name: Option<&str>) -> NamedRef {
    NamedRef {
        id: id.to_string(),
        name: name.unwrap_or_default().to_string(),
    }
}

/// Fetches everything the session list view needs, concurrently.
pub(crate) async fn fetch_session_views(
    state: &Arc<AppState>,
    token: &str,
    user_id: &str,
) -> Result<Vec<ClassSessionView>, crate::backend::BackendError> {
    let (sessions, courses, groups, classrooms, instructors) = try_join!(
        fetch_table_cached(state, token, user_id, "class_sessions"),
        fetch_table_cached(state, token, user_id, "courses"),
        fetch_table_cached(state, token, user_id, "class_groups"),
        fetch_table_cached(state, token, user_id, "classrooms"),
        fetch_table_cached(state, token, user_id, "instructors"),
    )?;

    Ok(build_session_views(
        &rows_as::<ClassSessionRow>(sessions)?,
        &rows_as::<CourseRow>(courses)?,
        &rows_as::<ClassGroupRow>(groups)?,
        &rows_as::<ClassroomRow>(classrooms)?,
        &rows_as::<InstructorRow>(instructors)?,
    ))
}

/// GET /class-sessions
pub async fn get_class_sessions(State(s): State<Arc<AppState>>) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match fetch_session_views(&s, &token, &user_id).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

/// POST /class-sessions
pub async fn post_class_session(
    State(s): State<Arc<AppState>>,
    Json(body): Json<SessionCreateRequest>,
) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    for (field, value) in [
        ("course_id", &body.course_id),
        ("class_group_id", &body.class_group_id),
        ("classroom_id", &body.classroom_id),
        ("instructor_id", &body.instructor_id),
    ] {
        if value.trim().is_empty() {
            return ApiErrorType::from((
                StatusCode::BAD_REQUEST,
                "Missing required field",
                Some(format!("Field is required: {}", field)),
            ))
            .into_response();
        }
    }

    info!("POST /class-sessions");
    let payload = json!({
        "course_id": body.course_id,
        "class_group_id": body.class_group_id,
        "classroom_id": body.classroom_id,
        "instructor_id": body.instructor_id,
        "user_id": user_id,
    });

    match s.backend.insert(&token, "class_sessions", &payload).await {
        Ok(row) => {
            s.cache
                .invalidate(&SessionKey::from_token(&token), "class_sessions");
            (StatusCode::CREATED, Json(row)).into_response()
        }
        Err(e) => backend_error_to_response(e),
    }
}

/// DELETE /class-sessions/:id
pub async fn delete_class_session(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    info!("DELETE /class-sessions/{}", id);
    let filters = [("id", format!("eq.{}", id)), owner_filter(&user_id)];
    match s
        .backend
        .delete_where(&token, "class_sessions", &filters)
        .await
    {
        Ok(()) => {
            s.cache
                .invalidate(&SessionKey::from_token(&token), "class_sessions");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => backend_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_row(id: &str, course: &str, group: &str, room: &str, instr: &str) -> ClassSessionRow {
        ClassSessionRow {
            id: id.to_string(),
            course_id: course.to_string(),
            class_group_id: group.to_string(),
            classroom_id: room.to_string(),
            instructor_id: instr.to_string(),
            user_id: "u1".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_build_session_views_resolves_names() {
        let sessions = vec![session_row("s1", "c1", "g1", "r1", "i1")];
        let courses = vec![CourseRow {
            id: "c1".to_string(),
            code: "MATH101".to_string(),
            name: "Algebra".to_string(),
            user_id: "u1".to_string(),
            created_at: None,
        }];
        let groups = vec![ClassGroupRow {
            id: "g1".to_string(),
            name: "Group A".to_string(),
            user_id: "u1".to_string(),
            created_at: None,
        }];
        let classrooms = vec![ClassroomRow {
            id: "r1".to_string(),
            name: "Room 1".to_string(),
            location: None,
            user_id: "u1".to_string(),
            created_at: None,
        }];
        let instructors = vec![InstructorRow {
            id: "i1".to_string(),
            name: "Dr. Smith".to_string(),
            email: None,
            user_id: "u1".to_string(),
            created_at: None,
        }];

        let views = build_session_views(&sessions, &courses, &groups, &classrooms, &instructors);
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.course.code, "MATH101");
        assert_eq!(view.course.name, "Algebra");
        assert_eq!(view.group.name, "Group A");
        assert_eq!(view.classroom.name, "Room 1");
        assert_eq!(view.instructor.name, "Dr. Smith");
    }

    #[test]
    fn test_build_session_views_dangling_fk_keeps_id() {
        let sessions = vec![session_row("s1", "missing", "g?", "r?", "i?")];
        let views = build_session_views(&sessions, &[], &[], &[], &[]);
        assert_eq!(views[0].course.id, "missing");
        assert_eq!(views[0].course.name, "");
        assert_eq!(views[0].group.id, "g?");
    }
}
