//! 2FA enrollment lifecycle: enable (stage secret), verify (prove
//! possession, mint backup codes), disable (password re-entry), status.

use axum::{Json, extract::Extension, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::{
    api::state::AppState,
    auth::{password, totp},
};

use super::{
    error::AuthError,
    principal::CurrentUser,
    storage::{disable_two_factor, enable_two_factor, stage_two_factor_secret},
    types::{
        GenericMessage, TwoFactorDisableRequest, TwoFactorEnrollment, TwoFactorStatus,
        TwoFactorVerifyRequest, TwoFactorVerifyResponse,
    },
};

#[utoipa::path(
    post,
    path = "/api/v1/2fa/enable",
    responses(
        (status = 200, description = "Enrollment material", body = TwoFactorEnrollment),
        (status = 401, description = "Not authenticated")
    ),
    tag = "2fa"
)]
pub async fn enable(
    user: CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    // The secret is staged unverified; 2FA only gates login after a code
    // has been verified.
    let secret = totp::TotpEngine::generate_secret();
    let (provisioning_uri, qr_code) = state.totp().provisioning(&secret, &user.record.email)?;
    stage_two_factor_secret(&pool, user.record.id, &secret).await?;

    Ok(Json(TwoFactorEnrollment {
        secret,
        qr_code,
        provisioning_uri,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/2fa/verify",
    request_body = TwoFactorVerifyRequest,
    responses(
        (status = 200, description = "2FA enabled, backup codes shown once", body = TwoFactorVerifyResponse),
        (status = 400, description = "Setup not initiated"),
        (status = 401, description = "Invalid verification code")
    ),
    tag = "2fa"
)]
pub async fn verify(
    user: CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    Json(request): Json<TwoFactorVerifyRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let secret = user
        .record
        .two_factor_secret
        .as_deref()
        .ok_or(AuthError::TwoFactorSetupMissing)?;
    if !state.totp().verify_code(secret, &request.code) {
        return Err(AuthError::InvalidVerificationCode);
    }

    let backup_codes = totp::generate_backup_codes(totp::BACKUP_CODE_COUNT);
    enable_two_factor(&pool, user.record.id, &backup_codes).await?;
    info!(user_id = %user.record.id, "two-factor enabled");

    Ok(Json(TwoFactorVerifyResponse {
        enabled: true,
        backup_codes,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/2fa/disable",
    request_body = TwoFactorDisableRequest,
    responses(
        (status = 200, description = "2FA disabled", body = GenericMessage),
        (status = 400, description = "Wrong password"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "2fa"
)]
pub async fn disable(
    user: CurrentUser,
    Extension(pool): Extension<PgPool>,
    Json(request): Json<TwoFactorDisableRequest>,
) -> Result<impl IntoResponse, AuthError> {
    // Disabling drops the second factor, so the password is re-checked.
    if !password::verify(&request.password, &user.record.password_hash) {
        return Err(AuthError::IncorrectCurrentPassword);
    }

    disable_two_factor(&pool, user.record.id).await?;
    info!(user_id = %user.record.id, "two-factor disabled");

    Ok(Json(GenericMessage::new("Two-factor authentication disabled")))
}

#[utoipa::path(
    get,
    path = "/api/v1/2fa/status",
    responses(
        (status = 200, description = "Current 2FA state", body = TwoFactorStatus),
        (status = 401, description = "Not authenticated")
    ),
    tag = "2fa"
)]
pub async fn status(user: CurrentUser) -> Json<TwoFactorStatus> {
    Json(TwoFactorStatus {
        enabled: user.record.two_factor_enabled,
        has_backup_codes: user
            .record
            .two_factor_backup_codes
            .as_ref()
            .is_some_and(|codes| !codes.is_empty()),
    })
}
