use axum::{http::StatusCode, Json};

use crate::models::{AuthUser, ErrorResponse};

pub const ADMIN_ROLE: &str = "admin";

pub fn is_admin(user: &AuthUser) -> bool {
    user.has_role(ADMIN_ROLE)
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if is_admin(user) {
        return Ok(());
    }
    Err(ErrorResponse::reply(StatusCode::FORBIDDEN, "Admin access required"))
}
