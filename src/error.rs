use thiserror::Error;
use std::collections::HashMap;
use serde::{Serialize, Deserialize};

// Import Axum types for HTTP response conversion
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Structured validation errors with field-level error mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationErrors {
    Single { field: String, message: String },
    Multiple { fields: HashMap<String, String> },
}

impl ValidationErrors {
    /// Builds a single-field validation error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationErrors::Single {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the message recorded for `field`, if any.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        match self {
            ValidationErrors::Single { field: f, message } if f == field => Some(message),
            ValidationErrors::Single { .. } => None,
            ValidationErrors::Multiple { fields } => fields.get(field).map(String::as_str),
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationErrors::Single { field, message } => write!(f, "{}: {}", field, message),
            ValidationErrors::Multiple { fields } => {
                let mut entries: Vec<_> = fields.iter().collect();
                entries.sort();
                let joined = entries
                    .into_iter()
                    .map(|(field, message)| format!("{}: {}", field, message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}", joined)
            }
        }
    }
}

/// Accumulates field errors so a payload can be checked in one pass.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`; the first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Returns `Ok(())` when nothing was recorded, a validation error otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(ValidationErrors::Multiple {
                fields: self.fields,
            }))
        }
    }
}

/// The custom error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from the sqlx library.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A failure while applying embedded migrations.
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A validation error with field-level details.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// A not found error. Also returned for rows owned by another user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An authentication error (missing, invalid or expired token).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The path exists but does not accept the request method.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(ValidationErrors::single(field, message))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::invalid("body", rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        // Non-numeric IDs never match a row
        Error::NotFound(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::invalid("image", rejection.body_text())
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Error::invalid("image", err.body_text())
    }
}

/// Convert custom Error to HTTP response
///
/// Maps each variant to a status code and a JSON body carrying an error
/// message and error code. Database and configuration details are logged,
/// never returned.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = match &self {
            Error::Validation(errors) => {
                match errors {
                    ValidationErrors::Single { field, message } => {
                        serde_json::json!({
                            "error": "Validation failed",
                            "code": "VALIDATION_ERROR",
                            "fields": {
                                field: message
                            }
                        })
                    }
                    ValidationErrors::Multiple { fields } => {
                        serde_json::json!({
                            "error": "Validation failed",
                            "code": "VALIDATION_ERROR",
                            "fields": fields
                        })
                    }
                }
            }
            Error::NotFound(msg) => {
                serde_json::json!({
                    "error": msg,
                    "code": "NOT_FOUND"
                })
            }
            Error::Authentication(msg) => {
                serde_json::json!({
                    "error": msg,
                    "code": "AUTHENTICATION_FAILED"
                })
            }
            Error::MethodNotAllowed(msg) => {
                serde_json::json!({
                    "error": msg,
                    "code": "METHOD_NOT_ALLOWED"
                })
            }
            Error::Sqlx(e) => {
                tracing::error!(error = %e, "Database error");
                serde_json::json!({
                    "error": "Database error",
                    "code": "INTERNAL_ERROR"
                })
            }
            Error::Migrate(e) => {
                tracing::error!(error = %e, "Migration error");
                serde_json::json!({
                    "error": "Database error",
                    "code": "INTERNAL_ERROR"
                })
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                serde_json::json!({
                    "error": "Internal server error",
                    "code": "INTERNAL_ERROR"
                })
            }
            Error::Config(e) => {
                tracing::error!(error = %e, "Configuration error");
                serde_json::json!({
                    "error": "Configuration error",
                    "code": "CONFIG_ERROR"
                })
            }
        };

        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Migrate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_empty_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_field_errors_keeps_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("title", "This field is required.");
        errors.add("title", "Ensure this field has no more than 200 characters.");
        errors.add("price", "This field is required.");

        match errors.into_result() {
            Err(Error::Validation(v)) => {
                assert_eq!(v.message_for("title"), Some("This field is required."));
                assert_eq!(v.message_for("price"), Some("This field is required."));
                assert_eq!(v.message_for("link"), None);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::invalid("name", "bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("Recipe not found".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Authentication("Missing Authorization header".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::MethodNotAllowed("POST".into()).into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            Error::Internal("disk full".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
