use std::panic;
use std::sync::Arc;

use journal_collab::config::Config;
use journal_collab::db::{EntryStore, MemoryEntryStore, PgEntryStore};
use journal_collab::{create_app, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration first: it carries the fallback log level
    let loaded = Config::load();
    let fallback_filter = loaded
        .as_ref()
        .map(Config::log_filter)
        .unwrap_or_else(|_| Config::default().log_filter());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter.into()))
        .init();

    info!("Starting server...");

    let config = loaded.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    if config.auth_jwt_secret.is_none() {
        warn!("No JWT secret configured - every authenticated request will fail");
    }

    // Connect the entry store
    let store: Arc<dyn EntryStore> = match &config.db_url {
        Some(db_url) => match PgEntryStore::connect(db_url).await {
            Ok(store) => {
                info!("Database initialized successfully");
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Falling back to in-memory entries; nothing will survive a restart");
                Arc::new(MemoryEntryStore::new())
            }
        },
        None => {
            warn!("No database URL configured - using in-memory entries");
            Arc::new(MemoryEntryStore::new())
        }
    };

    let address = config.server_address();
    let app = create_app(AppState::new(config, store));

    // Start the HTTP/WebSocket server
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
