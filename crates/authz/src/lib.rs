//! Session gate.
//!
//! A client is authenticated when its server-side session carries `isAuthenticated = true`.
//! There is no token, role or expiry beyond the session's own inactivity timeout.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use libris_http::error::AppError;
use tower_sessions::Session;

/// Session key holding the authentication flag.
pub const AUTHENTICATED_KEY: &str = "isAuthenticated";

pub async fn is_authenticated(session: &Session) -> bool {
    match session.get::<bool>(AUTHENTICATED_KEY).await {
        Ok(flag) => flag.unwrap_or(false),
        Err(err) => {
            tracing::warn!(error = %err, "session flag unreadable; treating as logged out");
            false
        }
    }
}

/// Set the flag, rotating the session id first.
pub async fn mark_authenticated(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(AUTHENTICATED_KEY, true).await
}

pub async fn clear_authenticated(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<bool>(AUTHENTICATED_KEY).await?;
    Ok(())
}

/// Middleware for `route_layer`: lets the request through only for authenticated sessions.
///
/// Requires a `SessionManagerLayer` further out; without one every request is rejected.
pub async fn require_authenticated(request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::error!("session gate mounted without a session layer");
        return AppError::unauthorized("login required").into_response();
    };

    if !is_authenticated(&session).await {
        tracing::debug!(path = %request.uri().path(), "unauthenticated request rejected");
        return AppError::unauthorized("login required").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use libris_http::router::RouterBuilder;
    use libris_kernel::settings::AuthSettings;
    use tower::ServiceExt;

    fn app() -> Router {
        app_with(&AuthSettings::default())
    }

    fn app_with(auth: &AuthSettings) -> Router {
        let private = Router::new()
            .route("/shelf", get(|| async { "secret shelf" }))
            .route_layer(middleware::from_fn(require_authenticated));

        let public = Router::new()
            .route(
                "/login",
                post(|session: Session| async move {
                    mark_authenticated(&session).await.unwrap();
                    StatusCode::NO_CONTENT
                }),
            )
            .route(
                "/logout",
                post(|session: Session| async move {
                    clear_authenticated(&session).await.unwrap();
                    StatusCode::NO_CONTENT
                }),
            );

        RouterBuilder::new()
            .mount_module("pages", private.merge(public))
            .with_sessions(auth)
            .build()
    }

    fn session_cookie(response: &Response) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
            .expect("session cookie set")
    }

    async fn get_shelf(app: &Router, cookie: Option<&str>) -> StatusCode {
        let mut request = Request::get("/api/pages/shelf");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    async fn login(app: &Router) -> String {
        let login = app
            .clone()
            .oneshot(Request::post("/api/pages/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::NO_CONTENT);
        session_cookie(&login)
    }

    #[tokio::test]
    async fn anonymous_requests_are_rejected() {
        let app = app();
        assert_eq!(get_shelf(&app, None).await, StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(Request::get("/api/pages/shelf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let app = app_with(&AuthSettings {
            session_ttl_secs: 1,
            ..AuthSettings::default()
        });
        let cookie = login(&app).await;
        assert_eq!(get_shelf(&app, Some(&cookie)).await, StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
        assert_eq!(
            get_shelf(&app, Some(&cookie)).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn login_opens_and_logout_closes_the_gate() {
        let app = app();
        let cookie = login(&app).await;

        assert_eq!(get_shelf(&app, Some(&cookie)).await, StatusCode::OK);

        let logout = app
            .clone()
            .oneshot(
                Request::post("/api/pages/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);

        assert_eq!(
            get_shelf(&app, Some(&cookie)).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
