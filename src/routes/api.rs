use crate::{
    handlers::{
        diagnostics, entry_create, entry_delete, entry_get, entry_list, entry_search, entry_share, entry_update,
        health_check, ready_check,
    },
    routes::auth_middleware::auth_middleware,
    AppState,
};
use axum::{routing::{get, post}, Router, middleware};

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router<AppState> {
    Router::<AppState>::new()
        .route("/entries", get(entry_list).post(entry_create))
        .route("/entries/search", get(entry_search))
        .route("/entries/:id", get(entry_get).put(entry_update).delete(entry_delete))
        .route("/entries/:id/share", post(entry_share))
        .route("/v1/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware)) // Applies to all routes added above
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}
