//! Process-wide session context.

use std::sync::RwLock;

use super::AuthResponse;

/// Holds the single current-session value with last-writer-wins
/// semantics: login, logout and session refresh each replace the whole
/// value. There is no per-user session table; the application serves
/// one authenticated session at a time, matching the original's
/// process-wide auth context.
#[derive(Default)]
pub struct AuthContext {
    current: RwLock<Option<AuthResponse>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current session.
    pub fn set(&self, session: AuthResponse) {
        if let Ok(mut guard) = self.current.write() {
            *guard = Some(session);
        }
    }

    /// Clears the current session.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.current.write() {
            *guard = None;
        }
    }

    /// Returns a clone of the current session, if any.
    pub fn get(&self) -> Option<AuthResponse> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }

    /// Returns true if a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;

    fn sample(token: &str) -> AuthResponse {
        AuthResponse {
            user: AuthUser {
                id: "user-1".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            token: token.to_string(),
        }
    }

    #[test]
    fn test_last_writer_wins() {
        let ctx = AuthContext::new();
        assert!(!ctx.is_authenticated());

        ctx.set(sample("first"));
        ctx.set(sample("second"));
        assert_eq!(ctx.get().expect("session").token, "second");

        ctx.clear();
        assert!(ctx.get().is_none());
    }
}
