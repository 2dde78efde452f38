//! Request and response bodies for the auth endpoints.
//!
//! Every operation gets an explicit struct; nothing accepts a loose map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
    pub two_factor_enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Full token pair returned by login, verify-2fa, and refresh.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPayload {
    #[must_use]
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}

/// Returned instead of [`TokenPayload`] when the account has 2FA enabled.
#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorChallenge {
    pub requires_2fa: bool,
    pub temp_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyTwoFactorRequest {
    pub temp_token: String,
    pub code: String,
}

/// Refresh token can arrive in the body or ride the `refresh_token` cookie.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenericMessage {
    pub message: String,
}

impl GenericMessage {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorEnrollment {
    /// Base32 TOTP seed, shown once for manual entry.
    pub secret: String,
    /// PNG data URL for authenticator apps.
    pub qr_code: String,
    pub provisioning_uri: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TwoFactorVerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorVerifyResponse {
    pub enabled: bool,
    /// Single-use fallback codes, shown exactly once.
    pub backup_codes: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TwoFactorDisableRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorStatus {
    pub enabled: bool,
    pub has_backup_codes: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TerminateOthersResponse {
    pub terminated: u64,
}
