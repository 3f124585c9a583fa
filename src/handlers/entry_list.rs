use axum::{extract::{Extension, State}, http::StatusCode, Json};
use tracing::error;

use crate::handlers::internal_error;
use crate::models::{AuthUser, EntriesResponse, ErrorResponse};
use crate::AppState;

/// Entries the caller owns or collaborates on, newest first
pub async fn entry_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<EntriesResponse>), (StatusCode, Json<ErrorResponse>)> {
    match state.store.list_entries_for(user.id).await {
        Ok(entries) => Ok((
            StatusCode::OK,
            Json(EntriesResponse {
                message: "Entries fetched successfully!".to_string(),
                data: entries,
            }),
        )),
        Err(e) => {
            error!("Error fetching entries for user {}: {}", user.id, e);
            Err(internal_error())
        }
    }
}
