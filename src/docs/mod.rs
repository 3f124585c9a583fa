use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// List the caller's own and shared entries, newest first
#[utoipa::path(
    get,
    path = "/api/entries",
    responses(
        (status = 200, description = "Entries fetched", body = EntriesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_list_doc() {}

/// Create an entry
#[utoipa::path(
    post,
    path = "/api/entries",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 422, description = "Invalid entry", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_create_doc() {}

/// Search the caller's own entries by title or content
#[utoipa::path(
    get,
    path = "/api/entries/search",
    params(
        ("text" = String, Query, description = "Case-insensitive pattern, at most 100 characters")
    ),
    responses(
        (status = 200, description = "Matching entries", body = EntriesResponse),
        (status = 400, description = "Search text missing", body = ErrorResponse),
        (status = 422, description = "Search text too long or not a valid pattern", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_search_doc() {}

/// Fetch one entry
#[utoipa::path(
    get,
    path = "/api/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry fetched", body = EntryResponse),
        (status = 404, description = "Entry not found or not accessible", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_get_doc() {}

/// Save an entry (owner or collaborator)
#[utoipa::path(
    put,
    path = "/api/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 404, description = "Entry not found or not editable", body = ErrorResponse),
        (status = 422, description = "Invalid entry", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_update_doc() {}

/// Delete an entry (owner only)
#[utoipa::path(
    delete,
    path = "/api/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry deleted", body = EntryResponse),
        (status = 404, description = "Entry not found or not owned", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_delete_doc() {}

/// Share an entry with a registered user (owner only)
#[utoipa::path(
    post,
    path = "/api/entries/{id}/share",
    params(("id" = String, Path, description = "Entry id")),
    request_body = ShareEntryRequest,
    responses(
        (status = 200, description = "Collaborator added", body = EntryResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Entry or user not found", body = ErrorResponse)
    ),
    security(("bearer" = []), ("cookie" = []))
)]
#[allow(dead_code)]
pub async fn entry_share_doc() {}

/// Live collaboration and host statistics (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Diagnostics", body = DiagnosticsResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

struct AuthSchemes;

impl Modify for AuthSchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
            components.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        entry_list_doc,
        entry_create_doc,
        entry_search_doc,
        entry_get_doc,
        entry_update_doc,
        entry_delete_doc,
        entry_share_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DiagnosticsResponse,
            Mood,
            Entry,
            EntryRequest,
            EntryResponse,
            EntriesResponse,
            ShareEntryRequest,
        )
    ),
    modifiers(&AuthSchemes),
    tags(
        (name = "api", description = "Journal entries and sharing")
    )
)]
pub struct ApiDoc;
