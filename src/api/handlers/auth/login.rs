//! Login and the 2FA verification step.
//!
//! Login stops at a short-lived challenge token when the account has 2FA
//! enabled; the full token pair is only minted once the code (or a backup
//! code) checks out. Both paths converge on [`issue_session`], which records
//! the device session, updates `last_login`, and sets the transport cookies.

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use crate::{api::state::AppState, auth::password};

use super::{
    cookies::apply_auth_cookies,
    device::DeviceMetadata,
    error::AuthError,
    storage::{
        UserRecord, create_session, find_user_by_email, find_user_by_id, redeem_backup_code,
        touch_last_login,
    },
    types::{LoginRequest, TokenPayload, TwoFactorChallenge, VerifyTwoFactorRequest},
};

pub(super) const SESSION_ID_HEADER: &str = "x-session-id";

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair, or a 2FA challenge when enabled", body = TokenPayload),
        (status = 401, description = "Incorrect email or password"),
        (status = 403, description = "Account is disabled")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let user = find_user_by_email(&pool, &request.email).await?;

    // Unknown email and wrong password are indistinguishable from outside.
    let Some(user) = user else {
        return Err(AuthError::InvalidCredentials);
    };
    if !password::verify(&request.password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }

    if user.two_factor_enabled && user.two_factor_secret.is_some() {
        let temp_token = state
            .codec()
            .issue_temp(user.id, &user.email)
            .map_err(anyhow::Error::new)?;
        return Ok(Json(TwoFactorChallenge {
            requires_2fa: true,
            temp_token,
        })
        .into_response());
    }

    let device = DeviceMetadata::from_request(&headers, Some(peer));
    issue_session(&state, &pool, &user, &device).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-2fa",
    request_body = VerifyTwoFactorRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPayload),
        (status = 401, description = "Invalid challenge or verification code")
    ),
    tag = "auth"
)]
pub async fn verify_2fa(
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<VerifyTwoFactorRequest>,
) -> Result<Response, AuthError> {
    let claims = state
        .codec()
        .decode(&request.temp_token)
        .map_err(|_| AuthError::InvalidOrExpiredChallenge)?;
    if !claims.temp_2fa {
        return Err(AuthError::InvalidOrExpiredChallenge);
    }
    let user_id = claims
        .user_id()
        .map_err(|_| AuthError::InvalidOrExpiredChallenge)?;

    let user = find_user_by_id(&pool, user_id)
        .await?
        .ok_or(AuthError::InvalidOrExpiredChallenge)?;
    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }
    let secret = user
        .two_factor_secret
        .as_deref()
        .filter(|_| user.two_factor_enabled)
        .ok_or(AuthError::InvalidOrExpiredChallenge)?;

    // TOTP first, single-use backup code as fallback.
    if !state.totp().verify_code(secret, &request.code)
        && !redeem_backup_code(&pool, user.id, &request.code).await?
    {
        return Err(AuthError::InvalidVerificationCode);
    }

    let device = DeviceMetadata::from_request(&headers, Some(peer));
    issue_session(&state, &pool, &user, &device).await
}

/// Mint the full token pair, record the device session, and set both
/// transport cookies. The new session id rides the `X-Session-ID` response
/// header so clients can exclude it from bulk termination later.
pub(super) async fn issue_session(
    state: &AppState,
    pool: &PgPool,
    user: &UserRecord,
    device: &DeviceMetadata,
) -> Result<Response, AuthError> {
    let access_token = state
        .codec()
        .issue_access(user.id, &user.email, &user.role)
        .map_err(anyhow::Error::new)?;
    let refresh_token = state
        .codec()
        .issue_refresh(user.id)
        .map_err(anyhow::Error::new)?;

    let session_id = create_session(
        pool,
        user.id,
        device,
        state.codec().refresh_ttl_seconds(),
    )
    .await?;
    touch_last_login(pool, user.id).await?;

    info!(user_id = %user.id, session_id = %session_id, "login");

    let mut headers = HeaderMap::new();
    apply_auth_cookies(
        &mut headers,
        state.config(),
        state.codec(),
        &access_token,
        &refresh_token,
    )
    .map_err(anyhow::Error::new)?;
    headers.insert(
        HeaderName::from_static(SESSION_ID_HEADER),
        HeaderValue::from_str(&session_id.to_string()).map_err(anyhow::Error::new)?,
    );

    Ok((headers, Json(TokenPayload::bearer(access_token, refresh_token))).into_response())
}
