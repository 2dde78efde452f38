//! Authorization gate: resolve the caller from a request.
//!
//! A single extraction step tries the `Authorization: Bearer` header first
//! and falls back to the `access_token` cookie, then decodes the token and
//! loads the user. The short-lived 2FA challenge token is flagged `temp_2fa`
//! and never passes this gate; neither does a refresh token.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::{
        role::{ADMIN_TIER, Role, SYSTEM_TIER},
        token::{Claims, TokenKind},
    },
};

use super::{
    cookies::{ACCESS_COOKIE, cookie_value},
    error::AuthError,
    storage::{UserRecord, find_user_by_id},
};

/// Authenticated caller, available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub(super) record: UserRecord,
    pub(super) role: Role,
}

/// Like [`CurrentUser`] but swallows every authentication failure into
/// `None`, for endpoints with mixed public/private behavior.
#[derive(Debug)]
pub struct OptionalUser(pub(super) Option<CurrentUser>);

/// [`CurrentUser`] restricted to the admin tier.
#[derive(Debug)]
pub struct AdminUser(pub(super) CurrentUser);

/// [`CurrentUser`] restricted to the system tier.
#[derive(Debug)]
pub struct SystemUser(pub(super) CurrentUser);

/// Bearer header first, cookie fallback.
pub(super) fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    bearer.or_else(|| cookie_value(headers, ACCESS_COOKIE))
}

/// Check that decoded claims grant normal API access and return the subject.
///
/// # Errors
/// Returns [`AuthError::Unauthenticated`] for challenge tokens, refresh
/// tokens, and malformed subjects.
pub(super) fn gate_claims(claims: &Claims) -> Result<Uuid, AuthError> {
    if claims.temp_2fa || claims.kind != TokenKind::Access {
        return Err(AuthError::Unauthenticated);
    }
    claims.user_id().map_err(|_| AuthError::Unauthenticated)
}

async fn resolve(parts: &Parts) -> Result<CurrentUser, AuthError> {
    let state = parts
        .extensions
        .get::<Arc<AppState>>()
        .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("missing app state extension")))?;
    let pool = parts
        .extensions
        .get::<PgPool>()
        .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("missing database pool extension")))?;

    let token = token_from_headers(&parts.headers).ok_or(AuthError::Unauthenticated)?;
    let claims = state
        .codec()
        .decode(&token)
        .map_err(|_| AuthError::Unauthenticated)?;
    let user_id = gate_claims(&claims)?;

    let record = find_user_by_id(pool, user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;
    if !record.is_active {
        return Err(AuthError::AccountDisabled);
    }

    let role = Role::parse(&record.role);
    Ok(CurrentUser { record, role })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts).await
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts).await.ok()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve(parts).await?;
        if !user.role.is_in(ADMIN_TIER) {
            return Err(AuthError::Forbidden);
        }
        Ok(Self(user))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SystemUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve(parts).await?;
        if !user.role.is_in(SYSTEM_TIER) {
            return Err(AuthError::Forbidden);
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{gate_claims, token_from_headers};
    use crate::auth::token::TokenCodec;
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION, header::COOKIE};
    use secrecy::SecretString;
    use uuid::Uuid;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("gate-test-secret"), 30, 7)
    }

    #[test]
    fn bearer_header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_fallback_when_header_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));
        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn access_claims_pass_the_gate() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec.issue_access(user_id, "a@b.c", "customer").unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(gate_claims(&claims).unwrap(), user_id);
    }

    #[test]
    fn challenge_token_is_rejected() {
        let codec = codec();
        let token = codec.issue_temp(Uuid::new_v4(), "a@b.c").unwrap();
        let claims = codec.decode(&token).unwrap();
        assert!(gate_claims(&claims).is_err());
    }

    #[test]
    fn refresh_token_is_rejected_at_the_gate() {
        let codec = codec();
        let token = codec.issue_refresh(Uuid::new_v4()).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert!(gate_claims(&claims).is_err());
    }
}
