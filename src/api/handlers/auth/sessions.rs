//! Multi-device session listing and termination.

use axum::{
    Json,
    extract::{Extension, Path},
    http::HeaderMap,
    response::IntoResponse,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    error::AuthError,
    login::SESSION_ID_HEADER,
    principal::CurrentUser,
    storage::{list_active_sessions, terminate_other_sessions, terminate_session},
    types::{GenericMessage, SessionResponse, TerminateOthersResponse},
};

#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "Active sessions, most recent activity first", body = [SessionResponse]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "sessions"
)]
pub async fn list(
    user: CurrentUser,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    let sessions = list_active_sessions(&pool, user.record.id).await?;
    let body: Vec<SessionResponse> = sessions
        .into_iter()
        .map(|session| SessionResponse {
            id: session.id,
            device_name: session.device_name,
            device_type: session.device_type,
            browser: session.browser,
            operating_system: session.operating_system,
            ip_address: session.ip_address,
            location: session.location,
            last_activity: session.last_activity,
            created_at: session.created_at,
        })
        .collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/terminate",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session terminated", body = GenericMessage),
        (status = 404, description = "No such session for this user"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "sessions"
)]
pub async fn terminate(
    user: CurrentUser,
    Extension(pool): Extension<PgPool>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    // Ownership is part of the predicate: another user's session id is
    // indistinguishable from an unknown one.
    if !terminate_session(&pool, user.record.id, session_id).await? {
        return Err(AuthError::SessionNotFound);
    }
    info!(user_id = %user.record.id, session_id = %session_id, "session terminated");
    Ok(Json(GenericMessage::new("Session terminated")))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/terminate-others",
    responses(
        (status = 200, description = "Other sessions terminated", body = TerminateOthersResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "sessions"
)]
pub async fn terminate_others(
    user: CurrentUser,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    // The session to keep is the one the client presents in X-Session-ID;
    // without it, every active session goes.
    let current = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());

    let terminated = terminate_other_sessions(&pool, user.record.id, current).await?;
    info!(user_id = %user.record.id, terminated, "other sessions terminated");
    Ok(Json(TerminateOthersResponse { terminated }))
}
