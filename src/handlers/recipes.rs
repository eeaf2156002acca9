use axum::{
    extract::{Extension, Multipart, Query, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Json,
};

use crate::{
    error::{Error, Result},
    handlers::{ApiJson, ApiPath},
    middleware::auth::AuthenticatedUser,
    models::recipes::{RecipeDetail, RecipeFilterParams, RecipePayload, RecipeSummary, WriteMode},
    services::recipes,
    state::AppState,
};

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

/// GET /api/v1/recipes
///
/// Lists the caller's recipes, newest first.
///
/// # Query Parameters
/// - `tags`: comma separated tag IDs; keeps recipes with any of them
/// - `ingredients`: comma separated ingredient IDs; keeps recipes with any of them
///
/// Both filters must hold when both are given.
///
/// # HTTP Status Codes
/// - `200 OK`: `{recipes, count}`
/// - `400 BAD_REQUEST`: Malformed ID list
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(params): Query<RecipeFilterParams>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let items: Vec<RecipeSummary> = recipes::list_recipes(&mut conn, auth_user.id, &params)
        .await?
        .into_iter()
        .map(RecipeSummary::from)
        .collect();

    Ok(Json(serde_json::json!({
        "recipes": items,
        "count": items.len()
    })))
}

/// POST /api/v1/recipes
///
/// Creates a recipe. `title`, `time_minutes` and `price` are required;
/// `tags` and `ingredients` are lists of `{name}` objects resolved against
/// the caller's labels, creating missing ones.
///
/// # HTTP Status Codes
/// - `201 CREATED`: `{recipe}` in detail form
/// - `400 BAD_REQUEST`: Validation error
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<RecipePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let recipe = recipes::create_recipe(&mut conn, auth_user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "recipe": RecipeDetail::from(recipe)
        })),
    ))
}

/// GET /api/v1/recipes/{id}
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let recipe = recipes::get_recipe(&mut conn, auth_user.id, id).await?;

    Ok(Json(serde_json::json!({
        "recipe": RecipeDetail::from(recipe)
    })))
}

/// PUT /api/v1/recipes/{id}
///
/// Full update; the create-time required fields must be present.
pub async fn replace_recipe(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<RecipePayload>,
) -> Result<Json<serde_json::Value>> {
    update_recipe(state, auth_user, id, request, WriteMode::Replace).await
}

/// PATCH /api/v1/recipes/{id}
///
/// Partial update; only supplied fields and relation sets change.
pub async fn patch_recipe(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<RecipePayload>,
) -> Result<Json<serde_json::Value>> {
    update_recipe(state, auth_user, id, request, WriteMode::Partial).await
}

async fn update_recipe(
    state: AppState,
    auth_user: AuthenticatedUser,
    id: i64,
    request: RecipePayload,
    mode: WriteMode,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let recipe = recipes::update_recipe(&mut conn, auth_user.id, id, request, mode).await?;

    Ok(Json(serde_json::json!({
        "recipe": RecipeDetail::from(recipe)
    })))
}

/// DELETE /api/v1/recipes/{id}
///
/// # HTTP Status Codes
/// - `204 NO_CONTENT`: Recipe, its links and its image file removed
/// - `404 NOT_FOUND`: No such recipe for the caller
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    recipes::delete_recipe(&mut conn, &state.storage, auth_user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/recipes/{id}/upload-image
///
/// Accepts `multipart/form-data` with the file in the `image` field.
///
/// # HTTP Status Codes
/// - `200 OK`: `{recipe: {id, image}}` with `image` as a `/media/...` URL
/// - `400 BAD_REQUEST`: Missing field, or the file is not a decodable image
/// - `404 NOT_FOUND`: No such recipe for the caller
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>> {
    let mut multipart = multipart?;

    let mut content = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            content = Some(field.bytes().await?);
            break;
        }
    }
    let content = content.ok_or_else(|| Error::invalid(IMAGE_FIELD, "No file was submitted."))?;

    let mut conn = state.pool.acquire().await.map_err(|e| {
        Error::Internal(format!("Failed to acquire database connection: {}", e))
    })?;

    let image = recipes::upload_image(&mut conn, &state.storage, auth_user.id, id, &content).await?;

    Ok(Json(serde_json::json!({
        "recipe": image
    })))
}
