//! Error taxonomy for the authentication flows.
//!
//! Every variant maps to a fixed status and a fixed, non-revealing message.
//! Enumeration-resistant operations collapse distinguishable internal states
//! before they get here: login reports the same error for an unknown email
//! and a wrong password, and forgot-password never fails at all. Internal
//! errors surface as a generic 500 and are logged, never echoed.

use axum::{
    Json,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("invalid or expired challenge token")]
    InvalidOrExpiredChallenge,
    #[error("invalid verification code")]
    InvalidVerificationCode,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("user not found or inactive")]
    UserNotFoundOrInactive,
    #[error("current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("new password must be different from current password")]
    SamePassword,
    #[error("invalid or expired reset token")]
    InvalidOrExpiredResetToken,
    #[error("invalid authentication credentials")]
    Unauthenticated,
    #[error("you don't have permission to access this resource")]
    Forbidden,
    #[error("{0}")]
    Validation(&'static str),
    #[error("email already registered")]
    EmailTaken,
    #[error("username already taken")]
    UsernameTaken,
    #[error("two-factor setup not initiated")]
    TwoFactorSetupMissing,
    #[error("session not found")]
    SessionNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::InvalidOrExpiredChallenge
            | Self::InvalidVerificationCode
            | Self::InvalidRefreshToken
            | Self::UserNotFoundOrInactive
            | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::IncorrectCurrentPassword
            | Self::SamePassword
            | Self::InvalidOrExpiredResetToken
            | Self::Validation(_)
            | Self::EmailTaken
            | Self::UsernameTaken
            | Self::TwoFactorSetupMissing => StatusCode::BAD_REQUEST,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details are logged, not echoed.
        let message = if let Self::Internal(err) = &self {
            error!("internal error: {err:#}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(ErrorBody { error: message });
        if matches!(self, Self::Unauthenticated) {
            (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;
    use axum::http::StatusCode;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::AccountDisabled.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InvalidOrExpiredResetToken.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::SamePassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::SessionNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_do_not_leak_which_half_failed() {
        // Same message whether the email or the password was wrong.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "incorrect email or password"
        );
        assert_eq!(
            AuthError::InvalidVerificationCode.to_string(),
            "invalid verification code"
        );
    }
}
