//! JWT authentication middleware
//!
//! Validates the bearer token on protected routes and makes the caller
//! available to handlers as an `AuthenticatedUser` extension.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::users::User,
    queries,
    services::jwt::authenticate_bearer,
    state::AppState,
};

/// Authenticated user extracted from JWT token
///
/// This struct is added to request extensions by the JWT middleware
/// after successful validation.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub id: Uuid,
    /// User's email address
    pub email: String,
    /// User's display name
    pub name: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// JWT authentication middleware
///
/// # Behavior
/// 1. Reads `Authorization: Bearer <token>`
/// 2. Validates JWT signature and expiration
/// 3. Loads the user; unknown and inactive users are rejected
/// 4. Adds `AuthenticatedUser` to request extensions
/// 5. Returns 401 if any step fails
///
/// # Usage
/// Apply this middleware to protected routes using `route_layer()`:
///
/// ```ignore
/// Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         jwt_auth_middleware,
///     ))
/// ```
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    let user_id = authenticate_bearer(auth_header, state.config.jwt.secret.expose_secret())?;

    // Connection goes back to the pool before the handler runs
    let user = {
        let mut conn = state.pool.acquire().await?;
        queries::users::get_user_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| Error::Authentication("User not found".to_string()))?
    };

    if !user.is_active {
        tracing::debug!(operation = "jwt_auth", user_id = %user.id, "Inactive user rejected");
        return Err(Error::Authentication("User account is disabled.".to_string()));
    }

    request.extensions_mut().insert(AuthenticatedUser::from(user));
    Ok(next.run(request).await)
}
