use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::accounts::AccountService;
use crate::errors::AccountError;

/// Verified token subject. A missing or bad token is rejected with `Forbidden`.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AccountService: FromRef<S>,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AccountError::Forbidden
            })?;

        let token = bearer_token(header).ok_or_else(|| {
            warn!("invalid auth scheme");
            AccountError::Forbidden
        })?;

        let accounts = AccountService::from_ref(state);
        accounts.authenticate(token).map(AuthUser)
    }
}

/// Expects `Bearer <token>`; the scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
