//! # Authentication
//!
//! ## Passwords
//! - bcrypt, fixed cost of 10
//! - Hashing/verifying runs on the blocking pool so it never stalls the runtime
//!
//! ## Tokens
//! - HS256 JWT signed with `JWT_SECRET`
//! - Claims: `userId`, `iat`, `exp`
//! - Valid for one day, no leeway
//!
//! ## Guard
//! - [`require_auth`] wraps the order routes
//! - Expects `Authorization: Bearer <token>`
//! - The resolved [`User`] is put into request extensions for the handler
//! - Every token or user failure is the same 401, the reason is only logged at debug level
//! - A failed user lookup is a storage error, logged and answered with a 500
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error,
};
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::{debug, error};

use crate::{error::AppError, models::User, state::AppState};

pub const BCRYPT_COST: u32 = 10;
pub const TOKEN_TTL_HOURS: i64 = 24;

const BEARER: &str = "Bearer ";

pub async fn hash_password(password: String) -> Result<String, AppError> {
    spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, Error> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, issued_at: DateTime<Utc>) -> Result<String, Error> {
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let Some(token) = bearer_token(headers) else {
        debug!("Auth rejected: missing or malformed Authorization header");
        return Err(AppError::Unauthorized);
    };

    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("Auth rejected: {e}");
        AppError::Unauthorized
    })?;

    match state.users.resolve_user(&claims.user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            debug!("Auth rejected: user {} no longer exists", claims.user_id);
            Err(AppError::Unauthorized)
        }
        Err(e) => {
            error!("User lookup for {} failed: {e}", claims.user_id);
            Err(e.into())
        }
    }
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let hash = hash_password("hunter2".to_string()).await.unwrap();
        let again = hash_password("hunter2".to_string()).await.unwrap();

        assert_ne!(hash, "hunter2");
        assert_ne!(hash, again);
        assert!(verify_password("hunter2".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".to_string(), hash).await.unwrap());
    }

    #[test]
    fn token_round_trips_user_id() {
        let keys = TokenKeys::new("secret");
        let token = keys.issue("user-1").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("secret");
        let token = keys
            .issue_at("user-1", Utc::now() - Duration::hours(TOKEN_TTL_HOURS + 1))
            .unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_is_valid_until_the_day_is_over() {
        let keys = TokenKeys::new("secret");
        let token = keys
            .issue_at("user-1", Utc::now() - Duration::hours(TOKEN_TTL_HOURS - 1))
            .unwrap();

        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let keys = TokenKeys::new("secret");
        let token = keys.issue("user-1").unwrap();

        // claims of another user under the original signature
        let other = keys.issue("user-2").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert!(keys.verify(&tampered).is_err());

        let foreign = TokenKeys::new("other-secret").issue("user-1").unwrap();
        assert!(keys.verify(&foreign).is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
