use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{Error, Result, ValidationErrors},
    models::users::{NewUser, User},
};

use crate::DbConn;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_active, is_staff, is_superuser, created_at, updated_at";

fn map_unique_email(e: sqlx::Error) -> Error {
    let error_msg = e.to_string().to_lowercase();

    // Check for unique constraint violations on users.email
    if error_msg.contains("unique") || error_msg.contains("users.email") {
        Error::Validation(ValidationErrors::Single {
            field: "email".to_string(),
            message: "User with this email already exists.".to_string(),
        })
    } else {
        Error::Sqlx(e)
    }
}

/// Creates a new user in the database.
pub async fn create_user(conn: &mut DbConn, new_user: NewUser) -> Result<User> {
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO users (id, email, name, password_hash, is_active, is_staff, is_superuser, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 1, $5, $6, $7, $7)
        RETURNING {USER_COLUMNS}
        "#
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::now_v7())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.is_staff)
        .bind(new_user.is_superuser)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(map_unique_email)?;

    Ok(user)
}

/// Gets a single user by their ID. The user may not exist.
pub async fn get_user_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(user)
}

/// Gets a single user by their email address. The user may not exist.
pub async fn get_user_by_email(conn: &mut DbConn, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(user)
}

/// Updates an existing user's email, name and password hash.
pub async fn update_user(conn: &mut DbConn, user: &User) -> Result<User> {
    let sql = format!(
        r#"
        UPDATE users
        SET email = $1, name = $2, password_hash = $3, updated_at = $4
        WHERE id = $5
        RETURNING {USER_COLUMNS}
        "#
    );

    let updated_user = sqlx::query_as::<_, User>(&sql)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .bind(user.id)
        .fetch_optional(conn)
        .await
        .map_err(map_unique_email)?
        .ok_or_else(|| Error::NotFound(format!("User with ID {} not found", user.id)))?;

    Ok(updated_user)
}
