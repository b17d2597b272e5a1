use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::{validate_token, TOKEN_COOKIE};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, recovered from the `token` cookie.
///
/// Taking `AuthUser` as a handler argument is what guards a route: the
/// request is rejected with 401 before the handler runs when the cookie is
/// missing, badly signed or expired.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
}

impl AuthUser {
    /// Only the owner of `email` may act on it
    pub fn require_email(&self, email: Option<&str>) -> Result<(), ApiError> {
        match email {
            Some(requested) if requested == self.email => Ok(()),
            _ => {
                tracing::warn!("Forbidden: {} requested data for {:?}", self.email, email);
                Err(ApiError::forbidden("forbidden access"))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(TOKEN_COOKIE)
            .map(|c| c.value())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("unauthorized access"))?;

        let identity = validate_token(token, &state.config.security.jwt_secret)?;
        Ok(AuthUser { email: identity.email })
    }
}

/// HTTP-only session cookie carrying a signed token
pub fn session_cookie(token: String, security: &SecurityConfig) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}
