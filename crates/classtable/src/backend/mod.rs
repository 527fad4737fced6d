//! Typed client for the hosted backend.
//!
//! All persistence, authentication, and relational integrity belong to
//! the hosted service; this module is the application's only way of
//! reaching it.

mod client;
mod config;
mod error;
mod types;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::BackendError;
pub use types::*;
