use crate::{
    config::JwtConfig,
    error::{Error, Result},
    models::users::TokenResult,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user_id as string
    pub sub: String,
    /// Expiration time as Unix timestamp
    pub exp: i64,
    /// Issued at time as Unix timestamp
    pub iat: i64,
}

/// Issues an access token for a user using the configured secret and lifetime.
///
/// # Example
/// ```rust,no_run
/// use recipes::{config::JwtConfig, services::jwt::issue_token};
/// use uuid::Uuid;
///
/// let issued = issue_token(Uuid::now_v7(), &JwtConfig::default())?;
/// assert!(issued.expires_at > chrono::Utc::now());
/// # Ok::<(), recipes::error::Error>(())
/// ```
pub fn issue_token(user_id: Uuid, config: &JwtConfig) -> Result<TokenResult> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(config.access_token_expiration_minutes);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to generate JWT: {}", e)))?;

    Ok(TokenResult { token, expires_at })
}

/// Verifies a token's signature and expiry and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::Authentication("Token has expired".to_string()),
        ErrorKind::InvalidSignature => Error::Authentication("Invalid token signature".to_string()),
        _ => Error::Authentication(format!("Invalid token: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Resolves the user ID from an `Authorization: Bearer <token>` header value.
pub fn authenticate_bearer(auth_header: Option<&str>, secret: &str) -> Result<Uuid> {
    let token = extract_bearer_token(auth_header)?;
    let claims = verify_token(token, secret)?;
    Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::Authentication("Invalid user_id in token".to_string()))
}

/// Extracts the Bearer token from the Authorization header
fn extract_bearer_token(auth_header: Option<&str>) -> Result<&str> {
    match auth_header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            Some(_) => Err(Error::Authentication("Empty token".to_string())),
            None => Err(Error::Authentication(
                "Invalid Authorization header format. Expected: 'Bearer <token>'".to_string(),
            )),
        },
        None => Err(Error::Authentication(
            "Authentication credentials were not provided.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config(minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: SecretString::from("test-secret-key-for-testing".to_string()),
            access_token_expiration_minutes: minutes,
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let user_id = Uuid::now_v7();
        let issued = issue_token(user_id, &test_config(15)).unwrap();
        assert!(issued.token.contains('.'));
        assert!(issued.expires_at > Utc::now());

        let claims = verify_token(&issued.token, "test-secret-key-for-testing").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_verify_token_invalid_signature() {
        let issued = issue_token(Uuid::now_v7(), &test_config(15)).unwrap();
        assert!(verify_token(&issued.token, "wrong-secret").is_err());
    }

    #[test]
    fn test_verify_token_expired() {
        // Well past the default 60 second leeway
        let issued = issue_token(Uuid::now_v7(), &test_config(-10)).unwrap();
        match verify_token(&issued.token, "test-secret-key-for-testing") {
            Err(Error::Authentication(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected expired token error, got {:?}", other),
        }
    }

    #[test]
    fn test_authenticate_bearer() {
        let user_id = Uuid::now_v7();
        let issued = issue_token(user_id, &test_config(15)).unwrap();
        let header = format!("Bearer {}", issued.token);
        let extracted = authenticate_bearer(Some(&header), "test-secret-key-for-testing").unwrap();
        assert_eq!(extracted, user_id);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(extract_bearer_token(None).is_err());
        assert!(extract_bearer_token(Some("Token abc")).is_err());
        assert!(extract_bearer_token(Some("Bearer ")).is_err());
    }
}
