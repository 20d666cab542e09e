//! HTTP surface.
//!
//! Public routes: `/`, `/login` (GET and POST).
//! Protected routes, all behind `require_session`: `/logout`, `/page/{name}`.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::auth::{
    CredentialVerifier, Identity, LOGIN_PATH, SESSION_COOKIE, Secret, SessionCodec, Verdict,
    gate::{expired_session_cookie, require_session, session_cookie},
};
use crate::pages;

/// Where a successful login lands.
pub const LANDING_PATH: &str = "/page/dashboard";

/// Shared, read-only state for every request.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Session token codec bound to the active secret.
    codec: Arc<SessionCodec>,
    /// Login decision maker.
    verifier: Arc<CredentialVerifier>,
}

impl AppState {
    /// Build state from the secret resolved at startup.
    #[must_use]
    pub fn new(secret: &Secret, verifier: CredentialVerifier) -> Self {
        Self {
            codec: Arc::new(SessionCodec::new(secret)),
            verifier: Arc::new(verifier),
        }
    }
}

/// Build the application router.
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", get(logout))
        .route("/page/{name}", get(page))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.codec),
            require_session,
        ));

    Router::new()
        .route("/", get(|| async { Redirect::to(LOGIN_PATH) }))
        .route("/login", get(login_page).post(login))
        .merge(protected)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login_page(jar: CookieJar, Query(query): Query<LoginQuery>) -> Response {
    // Presence is enough here; the gate validates on the next hop.
    if jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| !cookie.value().is_empty())
    {
        return Redirect::to(LANDING_PATH).into_response();
    }

    Html(pages::render_login(query.error.as_deref())).into_response()
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::warn!("rejected malformed login form: {e}");
            return Redirect::to(&format!("{LOGIN_PATH}?error=invalid_credentials"))
                .into_response();
        }
    };

    let verdict = state.verifier.verify(&form.username, &form.password).await;

    let error = match verdict {
        Verdict::Authorized => match state.codec.mint(&form.username) {
            Ok(token) => {
                tracing::info!("'{}' logged in", form.username);
                return (jar.add(session_cookie(token)), Redirect::to(LANDING_PATH))
                    .into_response();
            }
            Err(e) => {
                tracing::error!("failed to mint session for '{}': {e}", form.username);
                "invalid_credentials"
            }
        },
        Verdict::EmptyFields => "empty_fields",
        Verdict::Rejected | Verdict::BackendUnavailable => "invalid_credentials",
    };

    Redirect::to(&format!("{LOGIN_PATH}?error={error}")).into_response()
}

async fn logout(identity: Identity, jar: CookieJar) -> impl IntoResponse {
    tracing::info!("'{}' logged out", identity.username());
    (jar.remove(expired_session_cookie()), Redirect::to(LOGIN_PATH))
}

async fn page(identity: Identity, Path(name): Path<String>, headers: HeaderMap) -> Response {
    let Some(page) = pages::find(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let fragment_only = headers
        .get("HX-Request")
        .is_some_and(|value| value.as_bytes() == b"true");

    Html(pages::render_page(page, identity.username(), fragment_only)).into_response()
}
