pub mod auth;
pub mod components;
pub mod sessions;
pub mod status;
pub mod timetable;
