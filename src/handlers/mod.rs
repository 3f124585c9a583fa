pub mod health;
pub mod diagnostics;
pub mod entry_create;
pub mod entry_list;
pub mod entry_get;
pub mod entry_update;
pub mod entry_delete;
pub mod entry_search;
pub mod entry_share;

pub use health::*;
pub use diagnostics::*;
pub use entry_create::*;
pub use entry_list::*;
pub use entry_get::*;
pub use entry_update::*;
pub use entry_delete::*;
pub use entry_search::*;
pub use entry_share::*;

use axum::{http::StatusCode, Json};

use crate::models::ErrorResponse;

/// Generic 500 reply; details stay in the logs
pub(crate) fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    ErrorResponse::reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong! Please try again later!",
    )
}
