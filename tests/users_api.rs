mod common;

use common::{
    TestApp, auth, count_users_by_email, generate_test_email, register_and_login, register_user,
};

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/health")).send().await.unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_user_success() {
    let app = TestApp::new().await;

    let body = register_user(&app, "cook@example.com", "Cook").await;

    assert_eq!(body["user"]["email"], "cook@example.com");
    assert_eq!(body["user"]["name"], "Cook");
    assert_eq!(body["user"]["is_staff"], false);
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_normalizes_email_domain() {
    let app = TestApp::new().await;

    let body = register_user(&app, "Cook@EXAMPLE.COM", "Cook").await;

    assert_eq!(body["user"]["email"], "Cook@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let app = TestApp::new().await;
    let email = generate_test_email();
    register_user(&app, &email, "First").await;

    let response = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&serde_json::json!({
            "email": email,
            "password": "anotherpass",
            "name": "Second"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["email"].is_string());
}

#[tokio::test]
async fn test_register_short_password_creates_no_user() {
    let app = TestApp::new().await;
    let email = generate_test_email();

    let response = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&serde_json::json!({
            "email": email,
            "password": "pw12",
            "name": "Short"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["fields"]["password"].is_string());

    assert_eq!(count_users_by_email(&app.pool, &email).await, 0);
}

#[tokio::test]
async fn test_register_missing_fields_reported_per_field() {
    let app = TestApp::new().await;
    let email = generate_test_email();

    let response = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["password"], "This field is required.");
    assert_eq!(body["fields"]["name"], "This field is required.");
    assert!(body["fields"].get("body").is_none());
    assert_eq!(count_users_by_email(&app.pool, &email).await, 0);
}

#[tokio::test]
async fn test_token_missing_password_reported_per_field() {
    let app = TestApp::new().await;
    let email = generate_test_email();
    register_user(&app, &email, "Cook").await;

    let response = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["password"], "This field is required.");
}

#[tokio::test]
async fn test_register_malformed_json_rejected() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/api/v1/users"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_token_issued_and_accepted() {
    let app = TestApp::new().await;
    let token = register_and_login(&app).await;

    let response = app
        .client
        .get(app.url("/api/v1/users/me"))
        .header("Authorization", auth(&token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["name"], "Test Cook");
}

#[tokio::test]
async fn test_token_bad_password() {
    let app = TestApp::new().await;
    let email = generate_test_email();
    register_user(&app, &email, "Cook").await;

    let response = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({
            "email": email,
            "password": "wrong-password"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["fields"]["non_field_errors"].is_string());
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_token_unknown_email() {
    let app = TestApp::new().await;

    let response = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({
            "email": "nobody@example.com",
            "password": "whatever"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/users/me")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(app.url("/api/v1/users/me"))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_patch_me_updates_name_and_password() {
    let app = TestApp::new().await;
    let email = generate_test_email();
    register_user(&app, &email, "Before").await;

    let token_response: serde_json::Value = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({ "email": email, "password": "testpass123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = token_response["token"].as_str().unwrap().to_string();

    let response = app
        .client
        .patch(app.url("/api/v1/users/me"))
        .header("Authorization", auth(&token))
        .json(&serde_json::json!({ "name": "After", "password": "newpassword" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["name"], "After");
    assert_eq!(body["user"]["email"], email);

    let response = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({ "email": email, "password": "newpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_put_me_requires_all_fields() {
    let app = TestApp::new().await;
    let token = register_and_login(&app).await;

    let response = app
        .client
        .put(app.url("/api/v1/users/me"))
        .header("Authorization", auth(&token))
        .json(&serde_json::json!({ "name": "Only name" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["fields"]["email"].is_string());
    assert!(body["fields"]["password"].is_string());

    let me: serde_json::Value = app
        .client
        .get(app.url("/api/v1/users/me"))
        .header("Authorization", auth(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["name"], "Test Cook");
}

#[tokio::test]
async fn test_post_me_not_allowed() {
    let app = TestApp::new().await;
    let token = register_and_login(&app).await;

    let response = app
        .client
        .post(app.url("/api/v1/users/me"))
        .header("Authorization", auth(&token))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = TestApp::new().await;

    let response = app.client.get(app.url("/api/v1/nothing-here")).send().await.unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}
