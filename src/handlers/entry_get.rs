use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};

use crate::auth::access::{ensure_entry_access, AccessError};
use crate::handlers::internal_error;
use crate::models::{AuthUser, EntryResponse, ErrorResponse};
use crate::AppState;

/// Fetch one entry. Used by clients to seed the editor before joining its room.
pub async fn entry_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, Json<ErrorResponse>)> {
    match ensure_entry_access(state.store.as_ref(), &entry_id, user.id).await {
        Ok(entry) => Ok((
            StatusCode::OK,
            Json(EntryResponse {
                message: "Entry fetched successfully!".to_string(),
                data: entry,
            }),
        )),
        Err(AccessError::Store(_)) => Err(internal_error()),
        Err(_) => Err(ErrorResponse::reply(
            StatusCode::NOT_FOUND,
            "Entry not found or you don't have access!",
        )),
    }
}
