use axum::{extract::{Extension, State}, http::StatusCode, Json};
use tracing::{error, info};

use crate::db::NewEntry;
use crate::handlers::internal_error;
use crate::models::{AuthUser, EntryRequest, EntryResponse, ErrorResponse};
use crate::services::entry_service::validate_entry_request;
use crate::AppState;

/// Create an entry owned by the caller
pub async fn entry_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, Json<ErrorResponse>)> {

    let changes = validate_entry_request(&request)
        .map_err(|message| ErrorResponse::reply(StatusCode::UNPROCESSABLE_ENTITY, message))?;

    let new_entry = NewEntry {
        created_by: user.id,
        date: changes.date,
        title: changes.title,
        mood: changes.mood,
        content: changes.content,
    };

    let entry = match state.store.create_entry(new_entry).await {
        Ok(entry) => entry,
        Err(e) => {
            error!("Error adding entry for user {}: {}", user.id, e);
            return Err(internal_error());
        }
    };
    info!("Entry {} created by {}", entry.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(EntryResponse {
            message: "Entry added successfully!".to_string(),
            data: entry,
        }),
    ))
}
