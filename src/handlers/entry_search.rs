use axum::{extract::{Extension, Query, State}, http::StatusCode, Json};
use tracing::error;

use crate::db::StoreError;
use crate::handlers::internal_error;
use crate::models::{AuthUser, EntriesResponse, ErrorResponse, SearchQuery};
use crate::services::entry_service::{validate_search_text, SearchTextError, MAX_SEARCH_CHARS};
use crate::AppState;

const INVALID_PATTERN: &str = "Search text is not a valid pattern!";

/// Search the caller's own entries by title or content
pub async fn entry_search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<(StatusCode, Json<EntriesResponse>), (StatusCode, Json<ErrorResponse>)> {

    let text = match validate_search_text(query.text.as_deref()) {
        Ok(text) => text,
        Err(SearchTextError::Missing) => {
            return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "Search text is required!"));
        }
        Err(SearchTextError::TooLong) => {
            return Err(ErrorResponse::reply(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Search string cannot exceed {} characters!", MAX_SEARCH_CHARS),
            ));
        }
    };

    // The store's regex dialect decides what a valid pattern is
    let entries = match state.store.search_entries(user.id, text).await {
        Ok(entries) => entries,
        Err(StoreError::InvalidPattern(_)) => {
            return Err(ErrorResponse::reply(StatusCode::UNPROCESSABLE_ENTITY, INVALID_PATTERN));
        }
        Err(e) => {
            error!("Error searching entries for user {}: {}", user.id, e);
            return Err(internal_error());
        }
    };

    let message = if entries.is_empty() {
        "No entries found!"
    } else {
        "Entries fetched successfully!"
    };
    Ok((
        StatusCode::OK,
        Json(EntriesResponse {
            message: message.to_string(),
            data: entries,
        }),
    ))
}
