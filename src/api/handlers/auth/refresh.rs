//! Token refresh and logout.
//!
//! Refresh rotates the pair: a new access and refresh token are minted each
//! time. The previous refresh token is not revoked server-side; the short
//! TTLs bound the exposure. Logout clears the transport cookies only.

use axum::{
    Json,
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::{api::state::AppState, auth::token::TokenKind};

use super::{
    cookies::{REFRESH_COOKIE, apply_auth_cookies, apply_clear_cookies, cookie_value},
    error::AuthError,
    storage::find_user_by_id,
    types::{GenericMessage, RefreshRequest, TokenPayload},
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPayload),
        (status = 401, description = "Invalid refresh token or inactive user")
    ),
    tag = "auth"
)]
pub async fn refresh(
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    request: Option<Json<RefreshRequest>>,
) -> Result<Response, AuthError> {
    // Body first, refresh cookie fallback.
    let token = request
        .and_then(|Json(body)| body.refresh_token)
        .or_else(|| cookie_value(&headers, REFRESH_COOKIE))
        .ok_or(AuthError::InvalidRefreshToken)?;

    let claims = state
        .codec()
        .decode(&token)
        .map_err(|_| AuthError::InvalidRefreshToken)?;
    if claims.kind != TokenKind::Refresh {
        return Err(AuthError::InvalidRefreshToken);
    }
    let user_id = claims
        .user_id()
        .map_err(|_| AuthError::InvalidRefreshToken)?;

    let user = find_user_by_id(&pool, user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::UserNotFoundOrInactive)?;

    let access_token = state
        .codec()
        .issue_access(user.id, &user.email, &user.role)
        .map_err(anyhow::Error::new)?;
    let refresh_token = state
        .codec()
        .issue_refresh(user.id)
        .map_err(anyhow::Error::new)?;

    let mut response_headers = HeaderMap::new();
    apply_auth_cookies(
        &mut response_headers,
        state.config(),
        state.codec(),
        &access_token,
        &refresh_token,
    )
    .map_err(anyhow::Error::new)?;

    Ok((
        response_headers,
        Json(TokenPayload::bearer(access_token, refresh_token)),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Cookies cleared", body = GenericMessage)
    ),
    tag = "auth"
)]
pub async fn logout(Extension(state): Extension<Arc<AppState>>) -> Result<Response, AuthError> {
    // No server-side revocation: outstanding access tokens ride out their
    // short TTL.
    let mut headers = HeaderMap::new();
    apply_clear_cookies(&mut headers, state.config()).map_err(anyhow::Error::new)?;
    Ok((headers, Json(GenericMessage::new("Logged out"))).into_response())
}
