//! Common helpers for end-to-end tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use cookie::Cookie;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::app::{AppState, router};
use crate::auth::{CredentialBackend, CredentialVerifier, SESSION_COOKIE, ensure_secret};
use crate::testing::StaticBackend;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";

/// A router backed by a temporary secret directory.
///
/// The directory is removed when the last `TestApp` sharing it is dropped.
pub struct TestApp {
    router: Router,
    dir: Arc<TempDir>,
}

impl TestApp {
    /// App with one host user (`USERNAME`/`PASSWORD`) and debug mode off.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(StaticBackend::with_user(USERNAME, PASSWORD), false)
    }

    /// App with the given backend and debug setting.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_backend(backend: impl CredentialBackend + 'static, debug_mode: bool) -> Self {
        let dir = Arc::new(tempfile::tempdir().expect("Failed to create temp dir"));
        Self::build(dir, Arc::new(backend), debug_mode)
    }

    /// A fresh process over the same secret directory.
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    pub fn restart(&self) -> Self {
        Self::build(
            Arc::clone(&self.dir),
            Arc::new(StaticBackend::with_user(USERNAME, PASSWORD)),
            false,
        )
    }

    #[allow(clippy::expect_used)]
    fn build(dir: Arc<TempDir>, backend: Arc<dyn CredentialBackend>, debug_mode: bool) -> Self {
        let (secret, _) = ensure_secret(None, dir.path()).expect("Failed to ensure secret");
        let verifier = CredentialVerifier::new(backend, debug_mode, Duration::from_secs(5));
        Self {
            router: router(AppState::new(&secret, verifier)),
            dir,
        }
    }

    #[must_use]
    pub fn secret_directory(&self) -> &Path {
        self.dir.path()
    }

    /// Send a request through the full router.
    #[allow(clippy::expect_used)]
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// GET `path`, optionally presenting a session token.
    pub async fn get(&self, path: &str, session: Option<&str>) -> Response<Body> {
        self.send(get_request(path, session, &[])).await
    }

    /// POST the login form.
    #[allow(clippy::expect_used)]
    pub async fn login(&self, username: &str, password: &str) -> Response<Body> {
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .expect("valid request");
        self.send(request).await
    }

    /// Log in with `USERNAME`/`PASSWORD` and return the session token.
    #[allow(clippy::expect_used)]
    pub async fn session_token(&self) -> String {
        let response = self.login(USERNAME, PASSWORD).await;
        session_cookie(&response)
            .map(|c| c.value().to_string())
            .expect("login should set a session cookie")
    }
}

/// Build a GET request with an optional session cookie and extra headers.
#[allow(clippy::expect_used)]
pub fn get_request(path: &str, session: Option<&str>, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).expect("valid request")
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Check the response is a 303 redirect to `target`.
#[must_use]
pub fn redirects_to(response: &Response<Body>, target: &str) -> bool {
    response.status() == StatusCode::SEE_OTHER && location(response) == Some(target)
}

/// The `Location` header, if any.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// The `session` cookie set by the response, if any.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE)
}

/// Response body as UTF-8 text.
#[allow(clippy::expect_used)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}
