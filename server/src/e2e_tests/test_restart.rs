//! Test that sessions survive a restart over the same secret directory.

use axum::http::StatusCode;

use crate::auth::secret::SECRET_FILE_NAME;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_session_valid_after_restart() {
    let first = TestApp::new();
    let token = first.session_token().await;

    let second = first.restart();
    let response = second.get("/page/dashboard", Some(&token)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_secret_file_unchanged_by_restart() {
    let first = TestApp::new();
    let path = first.secret_directory().join(SECRET_FILE_NAME);
    let before = std::fs::read(&path).expect("secret persisted");

    let _second = first.restart();

    assert_eq!(std::fs::read(&path).expect("secret persisted"), before);
}

#[tokio::test]
async fn test_regenerated_secret_invalidates_sessions() {
    let first = TestApp::new();
    let token = first.session_token().await;

    std::fs::remove_file(first.secret_directory().join(SECRET_FILE_NAME)).expect("remove");
    let second = first.restart();
    let response = second.get("/page/dashboard", Some(&token)).await;

    assert!(redirects_to(&response, "/login"));
}
