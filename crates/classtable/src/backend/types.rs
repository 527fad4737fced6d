//! Wire types for the hosted backend.
//!
//! Row shapes mirror the backend-owned relational schema; the backend
//! defines and migrates the schema, this application only reads and
//! writes rows through it. The schema also carries `departments`,
//! `profiles`, `roles` and `users` tables that this application never
//! touches, so no shapes exist for them.

use serde::{Deserialize, Serialize};

/// A user as reported by the backend auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form attributes attached to a user at sign-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub name: Option<String>,
}

/// Token material for an active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Normalized result of a sign-in or sign-up call.
///
/// The auth service answers sign-in with a session object carrying the
/// user, and answers sign-up with either a session (confirmation off)
/// or a bare user (confirmation pending). Both are normalized here so
/// callers only deal with one shape.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub user: Option<BackendUser>,
    pub session: Option<SessionTokens>,
}

/// Row of the `courses` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRow {
    pub id: String,
    pub code: String,
    pub name: String,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Row of the `class_groups` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroupRow {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Row of the `classrooms` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomRow {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Row of the `instructors` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Row of the `class_sessions` table. All four foreign keys are
/// mandatory; referential integrity is enforced by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSessionRow {
    pub id: String,
    pub course_id: String,
    pub class_group_id: String,
    pub classroom_id: String,
    pub instructor_id: String,
    pub user_id: String,
    pub created_at: Option<String>,
}

/// Row of the `timetable_assignments` table. Links a class session and
/// class group to an integer period index; the index is opaque to this
/// application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableAssignmentRow {
    pub id: String,
    pub class_group_id: String,
    pub class_session_id: String,
    pub period_index: i64,
    pub user_id: String,
    pub created_at: Option<String>,
}
