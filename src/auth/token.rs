//! Signed access/refresh token codec.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret that is injected
//! at construction and immutable afterwards, so tests can run with distinct
//! secrets. Decoding collapses every failure mode (forged signature, expired,
//! structurally malformed) into a single [`TokenError::Invalid`] so callers
//! cannot distinguish an expired token from a forged one.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of the 2FA challenge token issued between password check and
/// code verification.
pub const TEMP_TOKEN_TTL_MINUTES: i64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Forged, expired, or malformed. Deliberately indistinct.
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token")]
    Sign,
}

/// Discriminator embedded in every token so an access token can never be
/// replayed as a refresh token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// String-encoded user id.
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Set only on the short-lived 2FA challenge token. A token with this
    /// flag must never pass the authorization gate.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temp_2fa: bool,
    #[serde(default)]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a user id.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] when the subject is not a UUID.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

/// Issues and verifies signed tokens. Cheap to clone and safe to share; the
/// secret is read-only after construction.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }

    /// Issue a full access token carrying email and role.
    ///
    /// # Errors
    /// Returns [`TokenError::Sign`] if signing fails.
    pub fn issue_access(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<String, TokenError> {
        self.sign(Claims {
            sub: user_id.to_string(),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
            temp_2fa: false,
            kind: TokenKind::Access,
            iat: 0,
            exp: 0,
        })
    }

    /// Issue the short-lived 2FA challenge token. It carries no role and is
    /// only accepted by the 2FA verification endpoint.
    ///
    /// # Errors
    /// Returns [`TokenError::Sign`] if signing fails.
    pub fn issue_temp(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.sign_with_ttl(
            Claims {
                sub: user_id.to_string(),
                email: Some(email.to_string()),
                role: None,
                temp_2fa: true,
                kind: TokenKind::Access,
                iat: 0,
                exp: 0,
            },
            Duration::minutes(TEMP_TOKEN_TTL_MINUTES),
        )
    }

    /// Issue a refresh token. Never carries role or elevated claims.
    ///
    /// # Errors
    /// Returns [`TokenError::Sign`] if signing fails.
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.sign_with_ttl(
            Claims {
                sub: user_id.to_string(),
                email: None,
                role: None,
                temp_2fa: false,
                kind: TokenKind::Refresh,
                iat: 0,
                exp: 0,
            },
            self.refresh_ttl,
        )
    }

    /// Verify signature and expiry and return the claims. Callers are
    /// responsible for checking `kind` and `temp_2fa` for their context.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] for any failure.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    fn sign(&self, claims: Claims) -> Result<String, TokenError> {
        self.sign_with_ttl(claims, self.access_ttl)
    }

    fn sign_with_ttl(&self, mut claims: Claims, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        claims.iat = now.timestamp();
        claims.exp = (now + ttl).timestamp();
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Sign)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{Claims, TokenCodec, TokenError, TokenKind};
    use chrono::Duration;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::from("test-secret-for-unit-tests"), 30, 7)
    }

    #[test]
    fn access_token_round_trips() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec
            .issue_access(user_id, "alice@example.com", "administrator")
            .unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.role.as_deref(), Some("administrator"));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(!claims.temp_2fa);
    }

    #[test]
    fn refresh_token_carries_kind_and_no_role() {
        let codec = codec();
        let token = codec.issue_refresh(Uuid::new_v4()).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(claims.role.is_none());
        assert!(claims.email.is_none());
    }

    #[test]
    fn temp_token_is_flagged() {
        let codec = codec();
        let token = codec.issue_temp(Uuid::new_v4(), "bob@example.com").unwrap();
        let claims = codec.decode(&token).unwrap();
        assert!(claims.temp_2fa);
        assert!(claims.role.is_none());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = codec()
            .issue_access(Uuid::new_v4(), "a@b.c", "guest")
            .unwrap();
        let other = TokenCodec::new(&SecretString::from("a-different-secret"), 30, 7);
        assert_eq!(other.decode(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec();
        let expired = codec
            .sign_with_ttl(
                Claims {
                    sub: Uuid::new_v4().to_string(),
                    email: None,
                    role: None,
                    temp_2fa: false,
                    kind: TokenKind::Access,
                    iat: 0,
                    exp: 0,
                },
                Duration::seconds(-30),
            )
            .unwrap();
        assert_eq!(codec.decode(&expired), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(codec().decode("not.a.token"), Err(TokenError::Invalid));
        assert_eq!(codec().decode(""), Err(TokenError::Invalid));
    }

    #[test]
    fn non_uuid_subject_rejected() {
        let claims = Claims {
            sub: "42".to_string(),
            email: None,
            role: None,
            temp_2fa: false,
            kind: TokenKind::Access,
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id(), Err(TokenError::Invalid));
    }
}
