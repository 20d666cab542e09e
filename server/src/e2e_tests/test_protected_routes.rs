//! Test the authorization gate in front of protected routes.

use axum::http::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_no_cookie_redirects_to_login() {
    let test = TestApp::new();

    for path in ["/page/dashboard", "/page/account", "/page/missing", "/logout"] {
        let response = test.get(path, None).await;
        assert!(redirects_to(&response, "/login"), "{path} should be gated");
    }
}

#[tokio::test]
async fn test_empty_cookie_redirects_to_login() {
    let test = TestApp::new();

    let response = test.get("/page/dashboard", Some("")).await;

    assert!(redirects_to(&response, "/login"));
}

#[tokio::test]
async fn test_invalid_cookie_redirects_and_is_cleared() {
    let test = TestApp::new();

    let response = test.get("/page/dashboard", Some("alice-forged")).await;

    assert!(redirects_to(&response, "/login"));
    let removal = session_cookie(&response).expect("stale cookie is cleared");
    assert!(removal.value().is_empty());
    assert_eq!(removal.http_only(), Some(true));
}

#[tokio::test]
async fn test_valid_cookie_exposes_identity() {
    let test = TestApp::new();
    let token = test.session_token().await;

    let response = test.get("/page/dashboard", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<strong>alice</strong>"));
    assert!(body.contains("<title>Dashboard</title>"));
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let test = TestApp::new();
    let token = test.session_token().await;

    let response = test.get("/page/nope", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_htmx_request_gets_fragment() {
    let test = TestApp::new();
    let token = test.session_token().await;

    let response = test
        .send(get_request(
            "/page/account",
            Some(&token),
            &[("HX-Request", "true")],
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.starts_with("<h1>Account</h1>"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_token_from_another_server_rejected() {
    let ours = TestApp::new();
    let theirs = TestApp::new();
    let token = theirs.session_token().await;

    let response = ours.get("/page/dashboard", Some(&token)).await;

    assert!(redirects_to(&response, "/login"));
}
