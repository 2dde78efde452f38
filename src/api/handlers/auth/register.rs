//! Account registration. Creates the user row only; no tokens are issued.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use tracing::info;

use crate::auth::{password, role::Role};

use super::{
    error::AuthError,
    storage::{NewUser, SignupOutcome, insert_user},
    types::{RegisterRequest, UserResponse},
};

const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_USERNAME_LENGTH: usize = 3;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input or email/username already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if !crate::api::handlers::valid_email(&request.email) {
        return Err(AuthError::Validation("invalid email address"));
    }
    if request.username.trim().len() < MIN_USERNAME_LENGTH {
        return Err(AuthError::Validation(
            "username must be at least 3 characters",
        ));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(
            "password must be at least 8 characters",
        ));
    }

    let password_hash = password::hash(&request.password)?;
    let outcome = insert_user(
        &pool,
        NewUser {
            email: request.email.trim(),
            username: request.username.trim(),
            password_hash: &password_hash,
            full_name: request.full_name.as_deref(),
            phone: request.phone.as_deref(),
            role: Role::Customer.as_str(),
        },
    )
    .await?;

    let user = match outcome {
        SignupOutcome::Created(user) => user,
        SignupOutcome::EmailTaken => return Err(AuthError::EmailTaken),
        SignupOutcome::UsernameTaken => return Err(AuthError::UsernameTaken),
    };

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            two_factor_enabled: user.two_factor_enabled,
        }),
    ))
}
