use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::{config::DatabaseConfig, error::Result};

/// How long a writer waits for the database lock before failing.
const BUSY_TIMEOUT_SECS: u64 = 10;

/// Database connection pool type
pub type DbPool = sqlx::SqlitePool;

/// Database connection type - supports both pool connections and transactions
/// Use `&mut conn` for pool connections, `&mut *tx` for transactions
pub type DbConn = sqlx::SqliteConnection;

/// Opens the connection pool, retrying while the database is unavailable.
///
/// Waits `retry_interval_ms` between attempts and gives up after
/// `connect_retries` failed attempts, returning the last error.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

    let mut attempt = 0;
    loop {
        attempt += 1;
        match SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => {
                tracing::info!(attempt, "Database available");
                return Ok(pool);
            }
            Err(e) if attempt <= config.connect_retries => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    "Database unavailable, waiting {}ms",
                    config.retry_interval_ms
                );
                tokio::time::sleep(Duration::from_millis(config.retry_interval_ms)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Applies the embedded migrations from `./migrations`.
pub async fn migrate(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connects and migrates in one step.
pub async fn init(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = connect(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}
