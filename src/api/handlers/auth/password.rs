//! Password change and the cache-backed reset flow.
//!
//! Forgot-password answers with one fixed body whether or not the email is
//! registered, and the reset email is dispatched on a detached task so
//! provider latency cannot distinguish the two cases. Redemption removes the
//! cache key before touching the password: a failed update still consumes
//! the token, which fails closed.

use axum::{Json, extract::Extension, response::IntoResponse};
use rand::{RngCore, rngs::OsRng};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    api::{
        email::{dispatch, reset_message},
        state::AppState,
    },
    auth::password,
};

use super::{
    error::AuthError,
    principal::CurrentUser,
    storage::{find_user_by_email, update_password},
    types::{ChangePasswordRequest, ForgotPasswordRequest, GenericMessage, ResetPasswordRequest},
};

const RESET_KEY_PREFIX: &str = "pwdreset:";
const RESET_TOKEN_BYTES: usize = 32;
const FORGOT_MESSAGE: &str = "If the email exists, a password reset link has been sent";

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = GenericMessage),
        (status = 400, description = "Wrong current password or unchanged password"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn change_password(
    user: CurrentUser,
    Extension(pool): Extension<PgPool>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if !password::verify(&request.current_password, &user.record.password_hash) {
        return Err(AuthError::IncorrectCurrentPassword);
    }
    if request.new_password == request.current_password {
        return Err(AuthError::SamePassword);
    }

    let password_hash = password::hash(&request.new_password)?;
    update_password(&pool, user.record.id, &password_hash).await?;

    Ok(Json(GenericMessage::new("Password updated")))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Generic acknowledgement", body = GenericMessage)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(user) = find_user_by_email(&pool, &request.email).await? {
        let token = generate_reset_token();
        state
            .cache()
            .put(
                &reset_cache_key(&token),
                &user.id.to_string(),
                state.config().reset_ttl(),
            )
            .await;

        let reset_link = format!(
            "{}/reset-password?token={token}",
            state.config().frontend_url().trim_end_matches('/')
        );
        dispatch(
            state.mailer(),
            reset_message(&user.email, &reset_link, state.config().reset_ttl_minutes()),
        );
        info!(user_id = %user.id, "password reset token issued");
    }

    // Identical body and status for registered and unknown emails.
    Ok(Json(GenericMessage::new(FORGOT_MESSAGE)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = GenericMessage),
        (status = 400, description = "Invalid or expired reset token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(state): Extension<Arc<AppState>>,
    Extension(pool): Extension<PgPool>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    // Single use: the key is gone after this call no matter what follows.
    let user_id = state
        .cache()
        .remove(&reset_cache_key(&request.token))
        .await
        .ok_or(AuthError::InvalidOrExpiredResetToken)?;
    let user_id =
        Uuid::parse_str(&user_id).map_err(|_| AuthError::InvalidOrExpiredResetToken)?;

    let password_hash = password::hash(&request.new_password)?;
    update_password(&pool, user_id, &password_hash).await?;
    info!(user_id = %user_id, "password reset");

    Ok(Json(GenericMessage::new("Password updated")))
}

fn reset_cache_key(token: &str) -> String {
    format!("{RESET_KEY_PREFIX}{token}")
}

/// URL-safe random token for the reset link.
fn generate_reset_token() -> String {
    let mut raw = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    raw.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_reset_token, reset_cache_key};

    #[test]
    fn reset_tokens_are_long_and_url_safe() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn cache_key_is_prefixed() {
        assert_eq!(reset_cache_key("abc"), "pwdreset:abc");
    }
}
