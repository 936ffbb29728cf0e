use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::jwt::{Claims, TokenService};
use crate::error::AppError;

/// Verified token claims for the caller of a protected route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn email(&self) -> &str {
        &self.0.email
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`. Any other scheme
/// (`Basic ...`) or a bare token counts as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    parts.next()
}

/// No token is `Unauthenticated`; a token that fails verification is `Forbidden`.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Claims, AppError> {
    let token = bearer_token(headers).ok_or_else(|| {
        warn!("missing bearer token");
        AppError::Unauthenticated
    })?;

    tokens.verify(token).map_err(|e| {
        warn!("invalid or expired token");
        AppError::from(e)
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        authenticate(&parts.headers, &tokens).map(AuthUser)
    }
}
