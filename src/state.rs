use crate::{config::Config, database::DbPool, services::storage::ImageStorage};
use std::sync::Arc;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for accessing the database
    pub pool: DbPool,
    /// Media storage for uploaded recipe images
    pub storage: Arc<ImageStorage>,
    /// Loaded configuration; handlers read the JWT settings from here
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState instance
    ///
    /// # Arguments
    /// * `pool` - Database connection pool
    /// * `storage` - Media storage rooted at the configured media directory
    /// * `config` - Loaded configuration
    pub fn new(pool: DbPool, storage: ImageStorage, config: Config) -> Self {
        Self {
            pool,
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }
}
