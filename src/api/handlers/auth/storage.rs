//! Database helpers for users and sessions.
//!
//! Free async functions over `&PgPool`, one query each, wrapped in a
//! `db.query` span. Backup-code consumption is the one multi-statement
//! operation: it runs inside a transaction with a row lock so two concurrent
//! verification attempts cannot both consume the same code.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::totp::consume_backup_code;

use super::device::DeviceMetadata;

#[derive(Debug, Clone)]
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) username: String,
    pub(super) password_hash: String,
    pub(super) full_name: Option<String>,
    pub(super) role: String,
    pub(super) is_active: bool,
    pub(super) two_factor_enabled: bool,
    pub(super) two_factor_secret: Option<String>,
    pub(super) two_factor_backup_codes: Option<Vec<String>>,
}

#[derive(Debug)]
pub(super) struct NewUser<'a> {
    pub(super) email: &'a str,
    pub(super) username: &'a str,
    pub(super) password_hash: &'a str,
    pub(super) full_name: Option<&'a str>,
    pub(super) phone: Option<&'a str>,
    pub(super) role: &'a str,
}

/// Outcome when attempting to create a new user row.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created(UserRecord),
    EmailTaken,
    UsernameTaken,
}

#[derive(Debug)]
pub(super) struct SessionRow {
    pub(super) id: Uuid,
    pub(super) device_name: Option<String>,
    pub(super) device_type: Option<String>,
    pub(super) browser: Option<String>,
    pub(super) operating_system: Option<String>,
    pub(super) ip_address: Option<String>,
    pub(super) location: Option<String>,
    pub(super) last_activity: DateTime<Utc>,
    pub(super) created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, username, password_hash, full_name, role, \
     is_active, two_factor_enabled, two_factor_secret, two_factor_backup_codes";

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        two_factor_enabled: row.get("two_factor_enabled"),
        two_factor_secret: row.get("two_factor_secret"),
        two_factor_backup_codes: row.get("two_factor_backup_codes"),
    }
}

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(super) async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to look up user by email")?;
    Ok(row.as_ref().map(user_from_row))
}

pub(super) async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to look up user by id")?;
    Ok(row.as_ref().map(user_from_row))
}

/// Insert a new user, mapping unique-constraint violations to a typed
/// outcome instead of an error.
pub(super) async fn insert_user(pool: &PgPool, new_user: NewUser<'_>) -> Result<SignupOutcome> {
    let query = format!(
        "INSERT INTO users (email, username, password_hash, full_name, phone, role) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
    );
    let result = sqlx::query(&query)
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.full_name)
        .bind(new_user.phone)
        .bind(new_user.role)
        .fetch_one(pool)
        .instrument(query_span("INSERT", &query))
        .await;

    match result {
        Ok(row) => Ok(SignupOutcome::Created(user_from_row(&row))),
        Err(err) => match unique_constraint(&err) {
            Some(constraint) if constraint.contains("username") => Ok(SignupOutcome::UsernameTaken),
            Some(_) => Ok(SignupOutcome::EmailTaken),
            None => Err(err).context("failed to insert user"),
        },
    }
}

pub(super) async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<()> {
    let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to update password")?;
    Ok(())
}

pub(super) async fn touch_last_login(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = "UPDATE users SET last_login = now() WHERE id = $1";
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to update last login")?;
    Ok(())
}

/// Store a freshly generated TOTP seed. 2FA stays disabled until the user
/// proves possession with a valid code.
pub(super) async fn stage_two_factor_secret(
    pool: &PgPool,
    user_id: Uuid,
    secret_base32: &str,
) -> Result<()> {
    let query =
        "UPDATE users SET two_factor_secret = $2, two_factor_enabled = false WHERE id = $1";
    sqlx::query(query)
        .bind(user_id)
        .bind(secret_base32)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to stage two-factor secret")?;
    Ok(())
}

pub(super) async fn enable_two_factor(
    pool: &PgPool,
    user_id: Uuid,
    backup_codes: &[String],
) -> Result<()> {
    let query = "UPDATE users SET two_factor_enabled = true, two_factor_backup_codes = $2 \
         WHERE id = $1";
    sqlx::query(query)
        .bind(user_id)
        .bind(backup_codes)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to enable two-factor")?;
    Ok(())
}

pub(super) async fn disable_two_factor(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = "UPDATE users SET two_factor_enabled = false, two_factor_secret = NULL, \
         two_factor_backup_codes = NULL WHERE id = $1";
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to disable two-factor")?;
    Ok(())
}

/// Atomically consume one backup code for the user. Returns true when the
/// submitted code matched and was removed. The `FOR UPDATE` lock serializes
/// concurrent attempts on the same user row.
pub(super) async fn redeem_backup_code(
    pool: &PgPool,
    user_id: Uuid,
    submitted: &str,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin backup-code transaction")?;

    let select = "SELECT two_factor_backup_codes FROM users WHERE id = $1 FOR UPDATE";
    let row = sqlx::query(select)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .instrument(query_span("SELECT", select))
        .await
        .context("failed to lock backup codes")?;

    let Some(row) = row else {
        return Ok(false);
    };
    let codes: Option<Vec<String>> = row.get("two_factor_backup_codes");
    let Some(remaining) = codes
        .as_deref()
        .and_then(|codes| consume_backup_code(codes, submitted))
    else {
        return Ok(false);
    };

    let update = "UPDATE users SET two_factor_backup_codes = $2 WHERE id = $1";
    sqlx::query(update)
        .bind(user_id)
        .bind(&remaining)
        .execute(&mut *tx)
        .instrument(query_span("UPDATE", update))
        .await
        .context("failed to store remaining backup codes")?;

    tx.commit().await.context("commit backup-code transaction")?;
    Ok(true)
}

pub(super) async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    device: &DeviceMetadata,
    ttl_seconds: i64,
) -> Result<Uuid> {
    let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
    let query = "INSERT INTO user_sessions \
         (user_id, device_name, device_type, browser, operating_system, ip_address, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id";
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(&device.device_name)
        .bind(&device.device_type)
        .bind(&device.browser)
        .bind(&device.operating_system)
        .bind(&device.ip_address)
        .bind(expires_at)
        .fetch_one(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to create session")?;
    Ok(row.get("id"))
}

/// Active, unexpired sessions for the user, most recent activity first.
pub(super) async fn list_active_sessions(pool: &PgPool, user_id: Uuid) -> Result<Vec<SessionRow>> {
    let query = "SELECT id, device_name, device_type, browser, operating_system, ip_address, \
         location, last_activity, created_at \
         FROM user_sessions \
         WHERE user_id = $1 AND is_active AND expires_at > now() \
         ORDER BY last_activity DESC";
    let rows = sqlx::query(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(query_span("SELECT", query))
        .await
        .context("failed to list sessions")?;

    Ok(rows
        .iter()
        .map(|row| SessionRow {
            id: row.get("id"),
            device_name: row.get("device_name"),
            device_type: row.get("device_type"),
            browser: row.get("browser"),
            operating_system: row.get("operating_system"),
            ip_address: row.get("ip_address"),
            location: row.get("location"),
            last_activity: row.get("last_activity"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Soft-deactivate one session owned by the user. Returns false when the id
/// does not belong to the caller. Repeating a successful call matches the
/// same row again, so termination stays idempotent.
pub(super) async fn terminate_session(
    pool: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<bool> {
    let query = "UPDATE user_sessions SET is_active = false WHERE id = $1 AND user_id = $2";
    let result = sqlx::query(query)
        .bind(session_id)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to terminate session")?;
    Ok(result.rows_affected() > 0)
}

/// Soft-deactivate every active session except the current one. Returns the
/// number of sessions affected.
pub(super) async fn terminate_other_sessions(
    pool: &PgPool,
    user_id: Uuid,
    current_session_id: Option<Uuid>,
) -> Result<u64> {
    let query = "UPDATE user_sessions SET is_active = false \
         WHERE user_id = $1 AND is_active AND ($2::uuid IS NULL OR id <> $2)";
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(current_session_id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to terminate other sessions")?;
    Ok(result.rows_affected())
}

fn unique_constraint(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.is_unique_violation() {
            return db_err.constraint().map(str::to_string);
        }
    }
    None
}
