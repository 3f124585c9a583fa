use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};
use tracing::{error, info};
use uuid::Uuid;

use crate::handlers::internal_error;
use crate::models::{AuthUser, EntryResponse, ErrorResponse};
use crate::AppState;

const NOT_DELETED: &str = "Entry not found or not deleted due to permissions!";

/// Delete an entry. Only its owner may.
///
/// Members already in the entry's room stay connected; the room simply
/// relays into nothing durable once the entry is gone.
pub async fn entry_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, Json<ErrorResponse>)> {

    let Ok(entry_uuid) = Uuid::parse_str(&entry_id) else {
        return Err(ErrorResponse::reply(StatusCode::NOT_FOUND, NOT_DELETED));
    };

    match state.store.delete_entry(entry_uuid, user.id).await {
        Ok(Some(entry)) => {
            info!("Entry {} deleted by {}", entry.id, user.id);
            Ok((
                StatusCode::OK,
                Json(EntryResponse {
                    message: "Entry deleted successfully!".to_string(),
                    data: entry,
                }),
            ))
        }
        Ok(None) => Err(ErrorResponse::reply(StatusCode::NOT_FOUND, NOT_DELETED)),
        Err(e) => {
            error!("Error deleting entry {}: {}", entry_id, e);
            Err(internal_error())
        }
    }
}
