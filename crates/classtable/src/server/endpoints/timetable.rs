//! Timetable endpoints: assignment rows and the scheduler grid view.
//!
//! Assignments are plain relational rows linking a class session and
//! class group to an integer period index. There is no constraint
//! solving or conflict detection; re-assigning an occupied period
//! simply replaces the previous row.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::try_join;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::backend::{ClassGroupRow, TimetableAssignmentRow};
use crate::server::endpoints::sessions::{fetch_session_views, ClassSessionView};
use crate::server::types::ApiErrorType;
use crate::server::util::{
    backend_error_to_response, current_session, fetch_table_cached, owner_filter, rows_as,
};
use crate::types::AppState;

/// Periods per timetable: 8 slots across 5 days. The indices are
/// opaque integers to this application; the backend stores them as-is.
pub const PERIOD_COUNT: usize = 40;

/// One class group's row in the scheduler grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSchedule {
    pub group_id: String,
    pub group_name: String,
    /// One slot per period index; `None` where nothing is assigned
    pub periods: Vec<Option<AssignedSession>>,
}

/// A session placed on a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedSession {
    pub assignment_id: String,
    pub session: ClassSessionView,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub class_group_id: String,
    pub class_session_id: String,
    pub period_index: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListParams {
    pub class_group_id: Option<String>,
}

/// Lays assignments out over the groups-by-periods grid. Out-of-range
/// period indices are skipped; when duplicate rows target the same
/// slot the last one wins, mirroring the rows' lack of any uniqueness
/// guarantee on this application's side.
pub(crate) fn build_grid(
    groups: &[ClassGroupRow],
    views: &[ClassSessionView],
    assignments: &[TimetableAssignmentRow],
    period_count: usize,
) -> Vec<GroupSchedule> {
    let views: HashMap<&str, &ClassSessionView> =
        views.iter().map(|v| (v.id.as_str(), v)).collect();

    groups
        .iter()
        .map(|group| {
            let mut periods: Vec<Option<AssignedSession>> = vec![None; period_count];
            for assignment in assignments
                .iter()
                .filter(|a| a.class_group_id == group.id)
            {
                let index = assignment.period_index;
                if index < 0 || index as usize >= period_count {
                    continue;
                }
                if let Some(view) = views.get(assignment.class_session_id.as_str()) {
                    periods[index as usize] = Some(AssignedSession {
                        assignment_id: assignment.id.clone(),
                        session: (*view).clone(),
                    });
                }
            }
            GroupSchedule {
                group_id: group.id.clone(),
                group_name: group.name.clone(),
                periods,
            }
        })
        .collect()
}

/// GET /scheduler
///
/// The full grid: every class group with its periods resolved to
/// assigned sessions.
pub async fn get_scheduler_grid(State(s): State<Arc<AppState>>) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let assignment_filters = [owner_filter(&user_id)];
    let fetched = try_join!(
        fetch_table_cached(&s, &token, &user_id, "class_groups"),
        fetch_session_views(&s, &token, &user_id),
        s.backend.select::<TimetableAssignmentRow>(
            &token,
            "timetable_assignments",
            &assignment_filters,
        ),
    );

    let (group_rows, views, assignments) = match fetched {
        Ok(v) => v,
        Err(e) => return backend_error_to_response(e),
    };

    let groups = match rows_as::<ClassGroupRow>(group_rows) {
        Ok(g) => g,
        Err(e) => return backend_error_to_response(e),
    };

    let grid = build_grid(&groups, &views, &assignments, PERIOD_COUNT);
    (
        StatusCode::OK,
        Json(json!({
            "period_count": PERIOD_COUNT,
            "groups": grid,
            "fetched_at": chrono::Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

/// GET /scheduler/assignments
pub async fn get_assignments(
    Query(params): Query<AssignmentListParams>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut filters = vec![owner_filter(&user_id)];
    if let Some(group_id) = params.class_group_id.filter(|g| !g.is_empty()) {
        filters.push(("class_group_id", format!("eq.{}", group_id)));
    }

    match s
        .backend
        .select::<Value>(&token, "timetable_assignments", &filters)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

/// POST /scheduler/assignments
///
/// Places a session on a period. When the slot is already occupied the
/// previous row is deleted first; the delete and insert are two
/// independent backend calls with no transaction around them.
pub async fn post_assignment(
    State(s): State<Arc<AppState>>,
    Json(body): Json<AssignRequest>,
) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if body.class_group_id.trim().is_empty() || body.class_session_id.trim().is_empty() {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "class_group_id and class_session_id are required",
            None,
        ))
        .into_response();
    }
    if body.period_index < 0 || body.period_index as usize >= PERIOD_COUNT {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "period_index out of range",
            Some(format!("Valid period indices are 0..{}", PERIOD_COUNT)),
        ))
        .into_response();
    }

    info!(
        "POST /scheduler/assignments group={} session={} period={}",
        body.class_group_id, body.class_session_id, body.period_index
    );

    let occupied = [
        ("class_group_id", format!("eq.{}", body.class_group_id)),
        ("period_index", format!("eq.{}", body.period_index)),
        owner_filter(&user_id),
    ];
    if let Err(e) = s
        .backend
        .delete_where(&token, "timetable_assignments", &occupied)
        .await
    {
        return backend_error_to_response(e);
    }

    let payload = json!({
        "class_group_id": body.class_group_id,
        "class_session_id": body.class_session_id,
        "period_index": body.period_index,
        "user_id": user_id,
    });
    match s
        .backend
        .insert(&token, "timetable_assignments", &payload)
        .await
    {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

/// DELETE /scheduler/assignments/:id
pub async fn delete_assignment(
    Path(id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    let (token, user_id) = match current_session(&s) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    info!("DELETE /scheduler/assignments/{}", id);
    let filters = [("id", format!("eq.{}", id)), owner_filter(&user_id)];
    match s
        .backend
        .delete_where(&token, "timetable_assignments", &filters)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::endpoints::sessions::{CourseRef, NamedRef};

    fn group(id: &str, name: &str) -> ClassGroupRow {
        ClassGroupRow {
            id: id.to_string(),
            name: name.to_string(),
            user_id: "u1".to_string(),
            created_at: None,
        }
    }

    fn view(id: &str) -> ClassSessionView {
        ClassSessionView {
            id: id.to_string(),
            course: CourseRef {
                id: "c1".to_string(),
                code: "MATH101".to_string(),
                name: "Algebra".to_string(),
            },
            group: NamedRef {
                id: "g1".to_string(),
                name: "Group A".to_string(),
            },
            classroom: NamedRef {
                id: "r1".to_string(),
                name: "Room 1".to_string(),
            },
            instructor: NamedRef {
                id: "i1".to_string(),
                name: "Dr. Smith".to_string(),
            },
        }
    }

    fn assignment(id: &str, group: &str, session: &str, period: i64) -> TimetableAssignmentRow {
        TimetableAssignmentRow {
            id: id.to_string(),
            class_group_id: group.to_string(),
            class_session_id: session.to_string(),
            period_index: period,
            user_id: "u1".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_build_grid_places_sessions() {
        let groups = vec![group("g1", "Group A"), group("g2", "Group B")];
        let views = vec![view("s1")];
        let assignments = vec![assignment("a1", "g1", "s1", 3)];

        let grid = build_grid(&groups, &views, &assignments, 8);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].periods.len(), 8);

        let placed = grid[0].periods[3].as_ref().expect("slot filled");
        assert_eq!(placed.assignment_id, "a1");
        assert_eq!(placed.session.course.code, "MATH101");

        // Other slots and the other group stay empty
        assert!(grid[0].periods[0].is_none());
        assert!(grid[1].periods.iter().all(Option::is_none));
    }

    #[test]
    fn test_build_grid_skips_out_of_range_and_keeps_last() {
        let groups = vec![group("g1", "Group A")];
        let views = vec![view("s1"), view("s2")];
        let assignments = vec![
            assignment("a1", "g1", "s1", 99),
            assignment("a2", "g1", "s1", 2),
            assignment("a3", "g1", "s2", 2),
        ];

        let grid = build_grid(&groups, &views, &assignments, 8);
        let placed = grid[0].periods[2].as_ref().expect("slot filled");
        assert_eq!(placed.assignment_id, "a3");
        assert_eq!(placed.session.id, "s2");
    }
}
