use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::issue_token;
use crate::error::{ApiError, ApiResult};
use crate::middleware::session_cookie;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
}

/// POST /jwt - issue a session token for the posted identity and set it as
/// the HTTP-only `token` cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let email = payload
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("email is required"))?;

    let security = &state.config.security;
    let token = issue_token(&email, &security.jwt_secret, security.token_expiry_secs).map_err(|e| {
        tracing::error!("Login failed for {}: {}", email, e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    tracing::info!("Issued session token for {}", email);
    Ok((jar.add(session_cookie(token, security)), Json(json!({ "success": true }))))
}
