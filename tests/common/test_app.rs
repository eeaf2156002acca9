use recipes::{
    AppState, Config, build_router, database, services::storage::ImageStorage,
};
use reqwest::{Client, redirect::Policy};
use secrecy::SecretString;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::net::TcpListener;

use super::database::TestDb;

/// HTTP test application wrapper
///
/// Runs the full router on a random port, backed by a private SQLite file
/// and media directory. Each test gets its own server instance to allow
/// parallel test execution.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// HTTP client for making requests
    pub client: Client,
    /// Application config
    pub config: Config,
    /// Pool shared with the server, for direct assertions
    pub pool: recipes::DbPool,
    /// Root of the media directory served under `/media`
    pub media_root: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// Create a new HTTP test app with server on random port
    ///
    /// # Example
    /// ```rust
    /// #[tokio::test]
    /// async fn test_health_endpoint() {
    ///     let app = TestApp::new().await;
    ///
    ///     let response = app.client
    ///         .get(&app.url("/api/v1/health"))
    ///         .send()
    ///         .await
    ///         .unwrap();
    ///
    ///     assert_eq!(response.status(), 200);
    /// }
    /// ```
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let media_root = dir.path().join("media");

        let mut config = Config::default();
        config.database = TestDb::config_for(&dir);
        config.jwt.secret = SecretString::from("test-secret-key-for-integration-tests".to_string());
        config.storage.media_root = media_root.display().to_string();

        let pool = database::init(&config.database)
            .await
            .expect("Failed to initialize test database");
        let storage = ImageStorage::new(&media_root);
        storage.init().await.expect("Failed to initialize media storage");

        let app = build_router(AppState::new(pool.clone(), storage, config.clone()));

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            config,
            pool,
            media_root,
            _dir: dir,
        }
    }

    /// Get the full URL for an API endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}
