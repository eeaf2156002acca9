//! Shared test helper functions

use image::{ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;

use crate::common::TestApp;

pub const TEST_PASSWORD: &str = "testpass123";

/// Generates a unique test email
pub fn generate_test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4().simple())
}

/// `Authorization` header value for a token.
pub fn auth(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Registers a user through the API and returns the response body.
pub async fn register_user(app: &TestApp, email: &str, name: &str) -> serde_json::Value {
    let response = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": name
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

/// Registers a fresh user and returns a bearer token for them.
pub async fn register_and_login(app: &TestApp) -> String {
    let email = generate_test_email();
    register_user(app, &email, "Test Cook").await;

    let response = app
        .client
        .post(app.url("/api/v1/users/token"))
        .json(&serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

/// Creates a recipe with the given extra fields merged over sample values
/// and returns the `recipe` object.
pub async fn create_recipe(app: &TestApp, token: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "title": "Sample recipe",
        "time_minutes": 22,
        "price": "5.25"
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }

    let response = app
        .client
        .post(app.url("/api/v1/recipes"))
        .header("Authorization", auth(token))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["recipe"].clone()
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(10, 10, Rgb([120, 80, 40]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}
