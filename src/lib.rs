//! # Custodia (Authentication & Session Security)
//!
//! `custodia` is the authentication authority for the back-office API. It
//! issues and verifies signed access/refresh token pairs, runs the TOTP
//! two-factor challenge flow with single-use backup codes, manages the
//! cache-backed password-reset flow, and tracks per-device sessions.
//!
//! ## Tokens
//!
//! Tokens are compact HS256-signed claim sets produced by
//! [`auth::token::TokenCodec`]. Access tokens are short-lived (minutes) and
//! carry the subject, email, and role. Refresh tokens are long-lived (days),
//! carry a `kind=refresh` discriminator, and are only ever accepted by the
//! refresh endpoint. A login on a 2FA-enabled account yields a ~5 minute
//! challenge token flagged `temp_2fa`; the authorization gate rejects it for
//! normal API access.
//!
//! ## Enumeration resistance
//!
//! Login collapses "no such user" and "wrong password" into one error, and
//! forgot-password returns the same body whether or not the email exists.
//! Error messages never reveal which half of a credential was wrong.
//!
//! ## Sessions
//!
//! Every full login records a `user_sessions` row with device metadata.
//! Sessions are soft-deactivated, never hard-deleted by the user; expired
//! rows are filtered at read time.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
