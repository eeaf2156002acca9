pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod queries;
pub mod services;
pub mod state;
pub mod validation;

pub use config::Config;
pub use database::{DbConn, DbPool};
pub use error::{Error, Result};
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use handlers::{health::health_check, labels, recipes, users};
use middleware::jwt_auth_middleware;

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Load configuration from environment variables
pub fn load_config() -> std::result::Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::load()?)
}

/// Builds the full application router.
///
/// Everything lives under `/api/v1` except uploaded media, which is served
/// from the storage root under `/media`. Routes other than health,
/// registration and token issue require a bearer token.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users", post(users::register))
        .route("/users/token", post(users::create_token));

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(users::me).put(users::replace_me).patch(users::patch_me),
        )
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::patch_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/upload-image",
            post(recipes::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/tags", get(labels::list_tags).post(labels::create_tag))
        .route(
            "/tags/{id}",
            put(labels::replace_tag)
                .patch(labels::patch_tag)
                .delete(labels::delete_tag),
        )
        .route(
            "/ingredients",
            get(labels::list_ingredients).post(labels::create_ingredient),
        )
        .route(
            "/ingredients/{id}",
            put(labels::replace_ingredient)
                .patch(labels::patch_ingredient)
                .delete(labels::delete_ingredient),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let api_routes = public_routes
        .merge(protected_routes)
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest_service("/media", ServeDir::new(state.storage.root().to_path_buf()))
        .fallback(not_found)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn method_not_allowed(method: Method, uri: Uri) -> Error {
    Error::MethodNotAllowed(format!("Method \"{}\" not allowed on {}", method, uri.path()))
}

async fn not_found(uri: Uri) -> Error {
    Error::NotFound(format!("No route for {}", uri.path()))
}
