use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};
use tracing::{error, info};
use uuid::Uuid;

use crate::handlers::internal_error;
use crate::models::{AuthUser, EntryResponse, ErrorResponse, ShareEntryRequest};
use crate::AppState;

/// Add a collaborator by email. Grants the right to open the entry and join
/// its room from now on.
pub async fn entry_share(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
    Json(request): Json<ShareEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, Json<ErrorResponse>)> {

    let not_found = || ErrorResponse::reply(StatusCode::NOT_FOUND, "Entry not found");

    let Ok(entry_uuid) = Uuid::parse_str(&entry_id) else {
        return Err(not_found());
    };

    let entry = match state.store.find_entry(entry_uuid).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            error!("Error loading entry {} for sharing: {}", entry_id, e);
            return Err(internal_error());
        }
    };

    if !entry.is_owner(user.id) {
        return Err(ErrorResponse::reply(StatusCode::FORBIDDEN, "Only the owner can share this entry"));
    }

    let collaborator = match state.store.find_user_by_email(request.email.trim()).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            return Err(ErrorResponse::reply(StatusCode::NOT_FOUND, "No user found with this email"));
        }
        Err(e) => {
            error!("Error looking up user for sharing entry {}: {}", entry_id, e);
            return Err(internal_error());
        }
    };

    match state.store.add_collaborator(entry.id, collaborator.id).await {
        Ok(Some(shared)) => {
            info!("Entry {} shared with {}", shared.id, collaborator.id);
            Ok((
                StatusCode::OK,
                Json(EntryResponse {
                    message: "User added as collaborator".to_string(),
                    data: shared,
                }),
            ))
        }
        Ok(None) => Err(not_found()),
        Err(e) => {
            error!("Error sharing entry {}: {}", entry_id, e);
            Err(internal_error())
        }
    }
}
