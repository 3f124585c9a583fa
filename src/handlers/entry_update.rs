use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};
use tracing::{error, info};

use crate::auth::access::{ensure_entry_access, AccessError};
use crate::handlers::internal_error;
use crate::models::{AuthUser, EntryRequest, EntryResponse, ErrorResponse};
use crate::services::entry_service::validate_entry_request;
use crate::AppState;

const NOT_EDITABLE: &str = "Entry not found or not editable by you!";

/// Save an entry. This is the only path that persists co-edited content.
pub async fn entry_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, Json<ErrorResponse>)> {

    let changes = validate_entry_request(&request)
        .map_err(|message| ErrorResponse::reply(StatusCode::UNPROCESSABLE_ENTITY, message))?;

    let entry = match ensure_entry_access(state.store.as_ref(), &entry_id, user.id).await {
        Ok(entry) => entry,
        Err(AccessError::Store(_)) => return Err(internal_error()),
        Err(_) => return Err(ErrorResponse::reply(StatusCode::NOT_FOUND, NOT_EDITABLE)),
    };

    match state.store.update_entry(entry.id, changes).await {
        Ok(Some(updated)) => {
            info!("Entry {} updated by {}", updated.id, user.id);
            Ok((
                StatusCode::OK,
                Json(EntryResponse {
                    message: "Entry updated successfully!".to_string(),
                    data: updated,
                }),
            ))
        }
        // Deleted between the access check and the write
        Ok(None) => Err(ErrorResponse::reply(StatusCode::NOT_FOUND, NOT_EDITABLE)),
        Err(e) => {
            error!("Error updating entry {}: {}", entry_id, e);
            Err(internal_error())
        }
    }
}
