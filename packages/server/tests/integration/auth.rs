use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

#[tokio::test]
async fn login_issues_a_token_that_opens_the_results_api() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": app.user.email, "password": PASSWORD}),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["email"], app.user.email);
    assert_eq!(res.body["role"], "ROLE_USER");

    let token = res.body["token"].as_str().expect("token");
    let id = app.create_result(token, 3.0, None).await;
    let read = app.get_with_token(&routes::result(id), token).await;
    assert_eq!(read.status, 200);
}

#[tokio::test]
async fn admin_login_reports_the_admin_role() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": app.admin.email, "password": PASSWORD}),
        )
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["role"], "ROLE_ADMIN");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let app = TestApp::spawn().await;

    let wrong = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": app.user.email, "password": "nope"}),
        )
        .await;
    let unknown = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": "ghost@example.com", "password": PASSWORD}),
        )
        .await;

    for res in [wrong, unknown] {
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn blank_credentials_are_a_validation_error() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::LOGIN, &json!({"email": "", "password": ""}))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}
