use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the cookie carrying the session token
pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>, ttl_secs: u64) -> Self {
        let now = Utc::now();
        Self {
            email: email.into(),
            exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Identity recovered from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing secret not configured")]
    InvalidSecret,

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

/// Sign a session token for `email`, valid for `ttl_secs`
pub fn issue_token(email: &str, secret: &str, ttl_secs: u64) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let claims = Claims::new(email, ttl_secs);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Check signature and expiry, returning the identity the token was issued for
pub fn validate_token(token: &str, secret: &str) -> Result<Identity, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    if token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

    Ok(Identity { email: data.claims.email })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_validates_to_same_identity() {
        let token = issue_token("ada@example.com", SECRET, 3600).unwrap();
        let identity = validate_token(&token, SECRET).unwrap();
        assert_eq!(identity.email, "ada@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("ada@example.com", SECRET, 3600).unwrap();
        assert!(matches!(validate_token(&token, "other-secret"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            email: "ada@example.com".into(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(AuthError::Expired)));
    }

    #[test]
    fn garbage_and_empty_tokens_are_rejected() {
        assert!(matches!(validate_token("not.a.jwt", SECRET), Err(AuthError::InvalidToken(_))));
        assert!(matches!(validate_token("", SECRET), Err(AuthError::MissingToken)));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        assert!(matches!(issue_token("ada@example.com", "", 3600), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn expiry_is_one_ttl_after_issue() {
        let claims = Claims::new("ada@example.com", 3600);
        assert_eq!(claims.exp - claims.iat, 3600);
    }
}
