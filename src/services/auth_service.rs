use axum::http;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AuthUser;

/// Cookie carrying the token for browser sessions
pub const AUTH_COOKIE: &str = "token";

/// Claims expected in a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = req.headers().get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        cookie::Cookie::split_parse(cookie_header)
            .flatten()
            .find(|c| c.name() == AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| format!("{} cookie not found", AUTH_COOKIE))
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &validation)
}

// Turn validated claims into the request identity
pub fn auth_user_from_claims(claims: Claims) -> Result<AuthUser, String> {
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|e| format!("Token subject '{}' is not a user id: {}", claims.sub, e))?;
    Ok(AuthUser {
        id,
        name: claims.name,
        roles: claims.roles,
    })
}
