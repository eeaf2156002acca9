use crate::DbConn;
use crate::{
    config::JwtConfig,
    error::{Error, FieldErrors, Result},
    models::users::{LoginUser, NewUser, RegisterUser, TokenResult, UpdateProfile, User},
    queries::users,
    services::jwt,
    validation::{normalize_email, validate_email, validate_password, validate_required_text},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";
const REQUIRED: &str = "This field is required.";

/// Registers a new user with password validation and hashing
pub async fn register_user(conn: &mut DbConn, register_user: RegisterUser) -> Result<User> {
    let new_user = prepare_new_user(register_user, false)?;
    let user = users::create_user(conn, new_user).await?;

    tracing::info!(operation = "register_user", user_id = %user.id, "User registered");
    Ok(user)
}

/// Creates a user with staff and superuser rights.
pub async fn create_superuser(conn: &mut DbConn, register_user: RegisterUser) -> Result<User> {
    let new_user = prepare_new_user(register_user, true)?;
    let user = users::create_user(conn, new_user).await?;

    tracing::info!(operation = "create_superuser", user_id = %user.id, "Superuser created");
    Ok(user)
}

/// Creates the configured superuser unless an account with that email exists.
pub async fn ensure_superuser(conn: &mut DbConn, email: &str, password: &str) -> Result<Option<User>> {
    let email = normalize_email(email);
    if users::get_user_by_email(conn, &email).await?.is_some() {
        tracing::debug!(operation = "ensure_superuser", "Superuser already present");
        return Ok(None);
    }

    let user = create_superuser(
        conn,
        RegisterUser {
            email: Some(email),
            password: Some(password.to_string()),
            name: Some("Administrator".to_string()),
        },
    )
    .await?;

    Ok(Some(user))
}

fn prepare_new_user(register_user: RegisterUser, superuser: bool) -> Result<NewUser> {
    let mut errors = FieldErrors::new();

    let email = match register_user.email.as_deref() {
        Some(email) => {
            let email = normalize_email(email);
            if let Err(Error::Validation(e)) = validate_email(&email) {
                errors.add("email", e.message_for("email").unwrap_or("Enter a valid email address."));
            }
            email
        }
        None => {
            errors.add("email", REQUIRED);
            String::new()
        }
    };

    let password = match register_user.password {
        Some(password) => {
            if let Err(Error::Validation(e)) = validate_password(&password) {
                errors.add("password", e.message_for("password").unwrap_or("Invalid password."));
            }
            password
        }
        None => {
            errors.add("password", REQUIRED);
            String::new()
        }
    };

    let name = match register_user.name.as_deref().map(|name| validate_required_text(name, "name")) {
        Some(Ok(name)) => name,
        Some(Err(Error::Validation(e))) => {
            errors.add("name", e.message_for("name").unwrap_or("Invalid name."));
            String::new()
        }
        Some(Err(e)) => return Err(e),
        None => {
            errors.add("name", REQUIRED);
            String::new()
        }
    };
    errors.into_result()?;

    Ok(NewUser {
        email,
        name,
        password_hash: hash_password(&password)?,
        is_staff: superuser,
        is_superuser: superuser,
    })
}

/// Authenticates a user by email and password and issues an access token.
///
/// Unknown emails, wrong passwords and inactive accounts all yield the same
/// validation error.
pub async fn obtain_token(conn: &mut DbConn, login: LoginUser, jwt_config: &JwtConfig) -> Result<TokenResult> {
    let mut errors = FieldErrors::new();
    if login.email.is_none() {
        errors.add("email", REQUIRED);
    }
    if login.password.is_none() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    let email = normalize_email(login.email.as_deref().unwrap_or_default());
    let password = login.password.as_deref().unwrap_or_default();
    let user = users::get_user_by_email(conn, &email)
        .await?
        .ok_or_else(|| Error::invalid("non_field_errors", INVALID_CREDENTIALS))?;

    if !user.is_active || !verify_password(password, &user.password_hash)? {
        tracing::debug!(operation = "obtain_token", user_id = %user.id, "Credentials rejected");
        return Err(Error::invalid("non_field_errors", INVALID_CREDENTIALS));
    }

    let issued = jwt::issue_token(user.id, jwt_config)?;
    tracing::info!(operation = "obtain_token", user_id = %user.id, "Token issued");
    Ok(issued)
}

/// Gets a user by ID, returning not-found when missing.
pub async fn get_user(conn: &mut DbConn, user_id: Uuid) -> Result<User> {
    users::get_user_by_id(conn, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User with ID {} not found", user_id)))
}

/// Updates the caller's profile.
///
/// With `require_all` (full update) email, name and password must all be
/// supplied; otherwise only supplied fields change.
pub async fn update_profile(conn: &mut DbConn, user_id: Uuid, update: UpdateProfile, require_all: bool) -> Result<User> {
    let mut user = get_user(conn, user_id).await?;
    let mut errors = FieldErrors::new();

    if require_all {
        for (field, present) in [
            ("email", update.email.is_some()),
            ("name", update.name.is_some()),
            ("password", update.password.is_some()),
        ] {
            if !present {
                errors.add(field, "This field is required.");
            }
        }
    }

    if let Some(email) = &update.email {
        let email = normalize_email(email);
        match validate_email(&email) {
            Ok(()) => user.email = email,
            Err(Error::Validation(e)) => {
                errors.add("email", e.message_for("email").unwrap_or("Enter a valid email address."))
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(name) = &update.name {
        match validate_required_text(name, "name") {
            Ok(name) => user.name = name,
            Err(Error::Validation(e)) => errors.add("name", e.message_for("name").unwrap_or("Invalid name.")),
            Err(e) => return Err(e),
        }
    }

    if let Some(password) = &update.password {
        match validate_password(password) {
            Ok(()) => user.password_hash = hash_password(password)?,
            Err(Error::Validation(e)) => {
                errors.add("password", e.message_for("password").unwrap_or("Invalid password."))
            }
            Err(e) => return Err(e),
        }
    }

    errors.into_result()?;

    let updated = users::update_user(conn, &user).await?;
    tracing::info!(operation = "update_profile", user_id = %updated.id, "Profile updated");
    Ok(updated)
}

/// Hashes a password using Argon2 with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verifies a password against a password hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("testpass123").unwrap();
        assert_ne!(hash, "testpass123");
        assert!(verify_password("testpass123", &hash).unwrap());
        assert!(!verify_password("wrongpass", &hash).unwrap());
    }

    #[test]
    fn test_prepare_new_user_collects_field_errors() {
        let result = prepare_new_user(
            RegisterUser {
                email: Some("not-an-email".to_string()),
                password: Some("pass".to_string()),
                name: Some(" ".to_string()),
            },
            false,
        );

        match result {
            Err(Error::Validation(e)) => {
                assert!(e.message_for("email").is_some());
                assert!(e.message_for("password").is_some());
                assert!(e.message_for("name").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_new_user_normalizes_email() {
        let new_user = prepare_new_user(
            RegisterUser {
                email: Some("Cook@EXAMPLE.com".to_string()),
                password: Some("password".to_string()),
                name: Some("Cook".to_string()),
            },
            true,
        )
        .unwrap();

        assert_eq!(new_user.email, "Cook@example.com");
        assert!(new_user.is_staff);
        assert!(new_user.is_superuser);
    }

    #[test]
    fn test_prepare_new_user_reports_missing_fields() {
        let result = prepare_new_user(
            RegisterUser {
                email: Some("cook@example.com".to_string()),
                ..Default::default()
            },
            false,
        );

        match result {
            Err(Error::Validation(e)) => {
                assert_eq!(e.message_for("password"), Some(REQUIRED));
                assert_eq!(e.message_for("name"), Some(REQUIRED));
                assert_eq!(e.message_for("email"), None);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
