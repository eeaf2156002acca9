//! Tag and ingredient endpoints.
//!
//! The two resources share handlers; each route binds a `LabelKind` through
//! a thin wrapper so the router stays declarative.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    error::{Error, Result},
    handlers::{ApiJson, ApiPath},
    middleware::auth::AuthenticatedUser,
    models::labels::{LabelFilterParams, LabelKind, LabelPayload},
    services::labels,
    state::AppState,
};

async fn list(
    state: AppState,
    kind: LabelKind,
    auth_user: AuthenticatedUser,
    params: LabelFilterParams,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let items = labels::list_labels(&mut conn, kind, auth_user.id, &params).await?;

    Ok(Json(serde_json::json!({
        kind.plural(): items,
        "count": items.len()
    })))
}

async fn create(
    state: AppState,
    kind: LabelKind,
    auth_user: AuthenticatedUser,
    request: LabelPayload,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let label = labels::create_label(&mut conn, kind, auth_user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            kind.singular(): label
        })),
    ))
}

async fn update(
    state: AppState,
    kind: LabelKind,
    auth_user: AuthenticatedUser,
    id: i64,
    request: LabelPayload,
    require_all: bool,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let label = labels::update_label(&mut conn, kind, auth_user.id, id, request, require_all).await?;

    Ok(Json(serde_json::json!({
        kind.singular(): label
    })))
}

async fn delete(state: AppState, kind: LabelKind, auth_user: AuthenticatedUser, id: i64) -> Result<StatusCode> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    labels::delete_label(&mut conn, kind, auth_user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/tags
///
/// Lists the caller's tags by descending name. `?assigned_only=1` keeps only
/// tags attached to at least one recipe.
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<LabelFilterParams>,
) -> Result<Json<serde_json::Value>> {
    list(state, LabelKind::Tag, auth_user, params).await
}

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    create(state, LabelKind::Tag, auth_user, request).await
}

/// PUT /api/v1/tags/{id}
pub async fn replace_tag(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<Json<serde_json::Value>> {
    update(state, LabelKind::Tag, auth_user, id, request, true).await
}

/// PATCH /api/v1/tags/{id}
pub async fn patch_tag(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<Json<serde_json::Value>> {
    update(state, LabelKind::Tag, auth_user, id, request, false).await
}

/// DELETE /api/v1/tags/{id}
///
/// Also detaches the tag from every recipe.
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    delete(state, LabelKind::Tag, auth_user, id).await
}

/// GET /api/v1/ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<LabelFilterParams>,
) -> Result<Json<serde_json::Value>> {
    list(state, LabelKind::Ingredient, auth_user, params).await
}

/// POST /api/v1/ingredients
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    create(state, LabelKind::Ingredient, auth_user, request).await
}

/// PUT /api/v1/ingredients/{id}
pub async fn replace_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<Json<serde_json::Value>> {
    update(state, LabelKind::Ingredient, auth_user, id, request, true).await
}

/// PATCH /api/v1/ingredients/{id}
pub async fn patch_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<LabelPayload>,
) -> Result<Json<serde_json::Value>> {
    update(state, LabelKind::Ingredient, auth_user, id, request, false).await
}

/// DELETE /api/v1/ingredients/{id}
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    delete(state, LabelKind::Ingredient, auth_user, id).await
}
