use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use tracing::{debug, error, warn};

use crate::models::ErrorResponse;
use crate::services::auth_service::{auth_user_from_claims, get_auth_token, validate_jwt};
use crate::AppState;

/// Resolve the bearer token into an [`AuthUser`](crate::models::AuthUser)
/// extension, or stop the request with a 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {

    let unauthorized = || ErrorResponse::reply(StatusCode::UNAUTHORIZED, "Unauthorized! Please log in.");

    // 1. Get the auth token from the header or cookie
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            debug!("Rejecting request to {}: {}", req.uri().path(), e);
            return Err(unauthorized());
        }
    };

    // 2. Validate the token
    let Some(secret) = state.config.auth_jwt_secret.as_deref() else {
        error!("Auth JWT secret not configured");
        return Err(ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, "Authentication is not configured"));
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            warn!("JWT validation failed: {}", e);
            return Err(unauthorized());
        }
    };

    // 3. Extract the user identity
    let user = match auth_user_from_claims(token_data.claims) {
        Ok(user) => user,
        Err(e) => {
            warn!("{}", e);
            return Err(unauthorized());
        }
    };
    debug!("Authenticated user {}", user.id);

    // 4. Hand the identity to downstream handlers
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
