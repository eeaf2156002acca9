use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    error::{Error, Result},
    handlers::ApiJson,
    middleware::auth::AuthenticatedUser,
    models::users::{LoginUser, RegisterUser, TokenResult, UpdateProfile},
    services::users,
    state::AppState,
};

/// POST /api/v1/users
///
/// Registers a new user.
///
/// # Request Body
/// - `email`: User's email address (must be unique; domain is lower-cased)
/// - `password`: 5 to 128 characters
/// - `name`: Display name
///
/// # HTTP Status Codes
/// - `201 CREATED`: User registered successfully
/// - `400 BAD_REQUEST`: Validation error or email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUser>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let user = users::register_user(&mut conn, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": user
        })),
    ))
}

/// POST /api/v1/users/token
///
/// Exchanges email and password for a bearer token.
///
/// # HTTP Status Codes
/// - `200 OK`: Returns `{token, expires_at}`
/// - `400 BAD_REQUEST`: Unknown email, wrong password or inactive account
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginUser>,
) -> Result<Json<TokenResult>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let issued = users::obtain_token(&mut conn, request, &state.config.jwt).await?;
    Ok(Json(issued))
}

/// GET /api/v1/users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let user = users::get_user(&mut conn, auth_user.id).await?;

    Ok(Json(serde_json::json!({
        "user": user
    })))
}

/// PUT /api/v1/users/me
///
/// Full profile update: `email`, `name` and `password` are all required.
pub async fn replace_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateProfile>,
) -> Result<Json<serde_json::Value>> {
    update_me(state, auth_user, request, true).await
}

/// PATCH /api/v1/users/me
///
/// Partial profile update; only supplied fields change.
pub async fn patch_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateProfile>,
) -> Result<Json<serde_json::Value>> {
    update_me(state, auth_user, request, false).await
}

async fn update_me(
    state: AppState,
    auth_user: AuthenticatedUser,
    request: UpdateProfile,
    require_all: bool,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let user = users::update_profile(&mut conn, auth_user.id, request, require_all).await?;

    Ok(Json(serde_json::json!({
        "user": user
    })))
}
