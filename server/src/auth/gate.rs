//! Authorization gate for protected routes.
//!
//! `require_session` is installed as a route layer over every protected route.
//! It reads the `session` cookie, decodes it, and either attaches an `Identity`
//! to the request or redirects to the login page.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use cookie::time::{Duration, OffsetDateTime};

use super::SessionCodec;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";
/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";
/// Lifetime of a session cookie. Enforced by the client only.
pub const SESSION_LIFETIME: Duration = Duration::hours(24);

/// The authenticated user of the current request.
///
/// Inserted by `require_session`; handlers take it as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
}

impl Identity {
    #[must_use]
    pub const fn new(username: String) -> Self {
        Self { username }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present behind `require_session`.
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}

/// Session cookie carrying `token`: `HttpOnly`, path `/`, expiring after `SESSION_LIFETIME`.
#[must_use]
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .expires(OffsetDateTime::now_utc() + SESSION_LIFETIME)
        .build()
}

/// Cookie that makes the client discard its session.
#[must_use]
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).http_only(true).path("/").build()
}

/// Middleware resolving the session cookie to an `Identity`.
///
/// # Post-conditions
/// - The wrapped handler runs only with an `Identity` in the request extensions.
/// - Otherwise the response is a redirect to `LOGIN_PATH`.
pub async fn require_session(
    State(codec): State<Arc<SessionCodec>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar
        .get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
    else {
        tracing::debug!("no session cookie on {}", request.uri().path());
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let Some(username) = codec.decode(token) else {
        tracing::debug!("invalid session cookie on {}", request.uri().path());
        // Drop the stale cookie so /login does not bounce back here.
        return (jar.remove(expired_session_cookie()), Redirect::to(LOGIN_PATH)).into_response();
    };

    request.extensions_mut().insert(Identity::new(username));
    next.run(request).await
}
