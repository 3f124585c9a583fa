pub mod api;
pub mod auth_middleware;

pub use api::create_api_routes;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::routes::auth_middleware::auth_middleware;
use crate::websocket::handler::websocket_handler;
use crate::AppState;

/// Assemble the REST API, the real-time endpoint and the API docs
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(state.clone()))
        // The real-time channel shares the REST authentication
        .route(
            "/ws",
            get(websocket_handler).route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() && state.config.is_development() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{EntryStore, MemoryEntryStore, NewEntry};
    use crate::models::{Entry, Mood, User};
    use crate::services::auth_service::tests::{sign, SECRET};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Fixture {
        app: Router,
        store: Arc<MemoryEntryStore>,
        alice: Uuid,
        bob: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryEntryStore::new());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .insert_user(User {
                id: bob,
                email: "bob@example.com".to_string(),
                first_name: "Bob".to_string(),
                last_name: "Builder".to_string(),
            })
            .await;

        let config = Config {
            auth_jwt_secret: Some(SECRET.to_string()),
            ..Config::default()
        };
        let state = AppState::new(config, store.clone());
        Fixture {
            app: create_app(state),
            store,
            alice,
            bob,
        }
    }

    async fn seed(store: &MemoryEntryStore, owner: Uuid, title: &str, content: &str) -> Entry {
        store
            .create_entry(NewEntry {
                created_by: owner,
                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                title: title.to_string(),
                mood: Mood::Happy,
                content: content.to_string(),
            })
            .await
            .unwrap()
    }

    async fn call(app: &Router, method: &str, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", sign(user, "Tester", &[])));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_is_public_but_entries_are_not() {
        let f = fixture().await;

        let (status, body) = call(&f.app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call(&f.app, "GET", "/api/entries", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
    }

    #[tokio::test]
    async fn create_validates_and_stores_entry() {
        let f = fixture().await;
        let valid = json!({"date": "2025-06-01", "title": "Beach", "mood": "🙂", "content": "Sand"});

        let (status, body) = call(&f.app, "POST", "/api/entries", Some(f.alice), Some(valid)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Entry added successfully!");
        assert_eq!(body["data"]["createdBy"], f.alice.to_string());

        let too_long = json!({"date": "2025-06-01", "title": "t".repeat(21), "mood": "🙂", "content": "x"});
        let (status, _) = call(&f.app, "POST", "/api/entries", Some(f.alice), Some(too_long)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(f.store.list_entries_for(f.alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_owner_and_collaborators_can_read_or_update() {
        let f = fixture().await;
        let entry = seed(&f.store, f.alice, "Diary", "secret").await;
        let uri = format!("/api/entries/{}", entry.id);

        let (status, body) = call(&f.app, "GET", &uri, Some(f.bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Entry not found or you don't have access!");

        f.store.add_collaborator(entry.id, f.bob).await.unwrap();
        let update = json!({"date": "2025-06-02", "title": "Diary", "mood": "😔", "content": "rewritten"});
        let (status, body) = call(&f.app, "PUT", &uri, Some(f.bob), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "rewritten");
        assert_eq!(body["data"]["mood"], "😔");
    }

    #[tokio::test]
    async fn only_owner_can_delete_or_share() {
        let f = fixture().await;
        let entry = seed(&f.store, f.alice, "Diary", "text").await;
        f.store.add_collaborator(entry.id, f.bob).await.unwrap();

        let share_uri = format!("/api/entries/{}/share", entry.id);
        let (status, body) = call(&f.app, "POST", &share_uri, Some(f.bob), Some(json!({"email": "bob@example.com"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Only the owner can share this entry");

        let uri = format!("/api/entries/{}", entry.id);
        let (status, _) = call(&f.app, "DELETE", &uri, Some(f.bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&f.app, "DELETE", &uri, Some(f.alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(f.store.find_entry(entry.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn share_by_email_adds_collaborator() {
        let f = fixture().await;
        let entry = seed(&f.store, f.alice, "Trip", "plans").await;
        let uri = format!("/api/entries/{}/share", entry.id);

        let (status, body) = call(&f.app, "POST", &uri, Some(f.alice), Some(json!({"email": "nobody@example.com"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No user found with this email");

        let (status, body) = call(&f.app, "POST", &uri, Some(f.alice), Some(json!({"email": "bob@example.com"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User added as collaborator");
        assert!(f.store.find_entry(entry.id).await.unwrap().unwrap().can_access(f.bob));
    }

    #[tokio::test]
    async fn search_covers_only_own_entries() {
        let f = fixture().await;
        seed(&f.store, f.alice, "Beach day", "waves").await;
        let shared = seed(&f.store, f.bob, "Beach trip", "sun").await;
        f.store.add_collaborator(shared.id, f.alice).await.unwrap();

        let (status, body) = call(&f.app, "GET", "/api/entries/search?text=beach", Some(f.alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["data"][0]["title"], "Beach day");

        let (status, body) = call(&f.app, "GET", "/api/entries/search", Some(f.alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Search text is required!");

        let long = format!("/api/entries/search?text={}", "a".repeat(101));
        let (status, _) = call(&f.app, "GET", &long, Some(f.alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(&f.app, "GET", "/api/entries/search?text=%28unclosed", Some(f.alice), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn diagnostics_require_admin_role() {
        let f = fixture().await;

        let (status, _) = call(&f.app, "GET", "/api/v1/diagnostics", Some(f.alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let req = Request::builder()
            .uri("/api/v1/diagnostics")
            .header(header::AUTHORIZATION, format!("Bearer {}", sign(f.alice, "Ops", &["admin"])))
            .body(Body::empty())
            .unwrap();
        let response = f.app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["n_conn"], 0);
    }

    #[tokio::test]
    async fn websocket_endpoint_requires_token() {
        let f = fixture().await;
        let (status, _) = call(&f.app, "GET", "/ws", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
