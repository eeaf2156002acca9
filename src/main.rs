use recipes::{AppState, build_router, database, load_config, services};
use secrecy::ExposeSecret;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recipes=info,tower_http=info")),
        )
        .init();

    let config = load_config()?;
    info!("Loaded configuration: {}", config);

    if config.jwt.uses_default_secret() {
        tracing::warn!("Using the built-in JWT secret; set RECIPES__JWT__SECRET in production");
    }

    info!("Initializing database...");
    let pool = database::init(&config.database).await?;

    let storage = services::storage::ImageStorage::new(&config.storage.media_root);
    storage.init().await?;

    if config.admin.is_configured() {
        let mut conn = pool.acquire().await?;
        services::users::ensure_superuser(
            &mut conn,
            &config.admin.email,
            config.admin.password.expose_secret(),
        )
        .await?;
    }

    let address = config.server.bind_address();
    let app = build_router(AppState::new(pool, storage, config));

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
