use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::{delete, get, patch, post};
use axum::{extract::State, middleware as mw, Router};

use crate::server::endpoints::{auth, components, sessions, status, timetable};
use crate::server::middleware::*;
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;
mod util;

/// Creates a router that can be used by `axum`.
///
/// The routing surface mirrors the application's pages: login, class
/// sessions, scheduler and the component-management console. The root
/// redirects on session presence and unknown paths redirect to the
/// root.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Routes that require an active session
    let protected_router = Router::new()
        .route(
            "/class-sessions",
            get(sessions::get_class_sessions).post(sessions::post_class_session),
        )
        .route("/class-sessions/:id", delete(sessions::delete_class_session))
        .route("/scheduler", get(timetable::get_scheduler_grid))
        .route(
            "/scheduler/assignments",
            get(timetable::get_assignments).post(timetable::post_assignment),
        )
        .route(
            "/scheduler/assignments/:id",
            delete(timetable::delete_assignment),
        )
        .route(
            "/components/:component",
            get(components::get_component_list).post(components::post_component),
        )
        .route(
            "/components/:component/:id",
            patch(components::patch_component).delete(components::delete_component),
        )
        .route("/auth/logout", post(auth::post_logout))
        .layer(mw::from_fn_with_state(
            app_state.clone(),
            session_validator::require_session,
        ));

    // Auth entry points stay open; /auth/me self-reports null when
    // logged out instead of failing.
    let open_router = Router::new()
        .route("/login", get(auth::get_login))
        .route("/auth/login", post(auth::post_login))
        .route("/auth/register", post(auth::post_register))
        .route("/auth/resend-verification", post(auth::post_resend_verification))
        .route("/auth/me", get(auth::get_me));

    Router::new()
        .route("/", get(root_redirect))
        .route("/health", get(status::get_health))
        .merge(open_router)
        .merge(protected_router)
        .fallback(fallback_redirect)
        .with_state(app_state)
}

/// GET /
///
/// Redirects to the session list when authenticated, to login when not.
async fn root_redirect(State(s): State<Arc<AppState>>) -> Redirect {
    if s.auth.is_authenticated() {
        Redirect::to("/class-sessions")
    } else {
        Redirect::to("/login")
    }
}

/// Any unknown path lands back on the root route.
async fn fallback_redirect() -> Redirect {
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthResponse, AuthUser};
    use crate::backend::{BackendClient, BackendConfig};
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{header::LOCATION, Request, StatusCode};
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            backend: BackendConfig {
                api_key: "test-key".to_string(),
                ..BackendConfig::default()
            },
            cache_ttl: Duration::from_secs(60),
        };
        let backend = BackendClient::new(config.backend.clone()).expect("client builds");
        Arc::new(AppState::new(config, backend))
    }

    fn logged_in(state: &Arc<AppState>) {
        state.auth.set(AuthResponse {
            user: AuthUser {
                id: "user-1".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            token: "jwt".to_string(),
        });
    }

    async fn send(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_redirects_to_root() {
        let resp = send(create_router(test_state()), "/no-such-page").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn test_root_redirects_to_login_without_session() {
        let resp = send(create_router(test_state()), "/").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_root_redirects_to_sessions_with_session() {
        let state = test_state();
        logged_in(&state);
        let resp = send(create_router(state), "/").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/class-sessions");
    }

    #[tokio::test]
    async fn test_protected_route_requires_session() {
        let resp = send(create_router(test_state()), "/class-sessions").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let resp = send(create_router(test_state()), "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
