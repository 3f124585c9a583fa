pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod websocket;
pub mod ws;

use std::sync::Arc;

use config::Config;
use db::EntryStore;
use ws::Hub;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn EntryStore>,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EntryStore>) -> Self {
        let hub = Hub::new(config.typing_expiry(), config.ws_send_queue);
        Self {
            config: Arc::new(config),
            store,
            hub: Arc::new(hub),
        }
    }
}

pub use routes::create_app;
