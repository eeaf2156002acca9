use recipes::{
    DbConn, DbPool,
    config::DatabaseConfig,
    database,
    models::{
        labels::LabelKind,
        users::{RegisterUser, User},
    },
    services::users,
};
use tempfile::TempDir;
use uuid::Uuid;

use super::helpers::generate_test_email;

/// Database-only test fixture backed by a throwaway SQLite file.
///
/// Each instance owns its own directory, so tests never share rows and can
/// run in parallel. The directory is removed when the fixture is dropped.
pub struct TestDb {
    pub pool: DbPool,
    _dir: TempDir,
}

impl TestDb {
    /// Creates a fresh, migrated database.
    ///
    /// # Example Usage:
    /// ```rust
    /// #[tokio::test]
    /// async fn test_something() {
    ///     let test_db = TestDb::new().await;
    ///     let mut conn = test_db.get_connection().await;
    ///     // ... test logic
    /// }
    /// ```
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = Self::config_for(&dir);
        let pool = database::init(&config).await.expect("Failed to initialize test database");

        Self { pool, _dir: dir }
    }

    pub fn config_for(dir: &TempDir) -> DatabaseConfig {
        DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("test.db").display()),
            max_connections: 5,
            connect_retries: 0,
            retry_interval_ms: 10,
        }
    }

    pub async fn get_connection(&self) -> sqlx::pool::PoolConnection<sqlx::Sqlite> {
        self.pool
            .acquire()
            .await
            .expect("Failed to get database connection")
    }

    /// Registers a user with a unique email and a known password.
    pub async fn create_user(&self, conn: &mut DbConn) -> User {
        users::register_user(
            conn,
            RegisterUser {
                email: Some(generate_test_email()),
                password: Some("testpass123".to_string()),
                name: Some("Test Cook".to_string()),
            },
        )
        .await
        .expect("Failed to create test user")
    }

    /// Counts rows in a table; handy for asserting nothing was written.
    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }

    /// Counts the user's labels of one kind with this exact name.
    pub async fn count_labels_named(&self, kind: LabelKind, user_id: Uuid, name: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = $1 AND name = $2", kind.table());

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(user_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count labels")
    }
}

/// Counts users registered with this exact email.
pub async fn count_users_by_email(pool: &DbPool, email: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("Failed to count users")
}
