//! TOTP engine and backup codes.
//!
//! Codes are RFC 6238 SHA-1/6-digit/30-second with a drift window of one
//! adjacent step in each direction. The window is a usability/replay
//! trade-off and is bounded; nothing here ever accepts a previously seen
//! code outside that window.
//!
//! Backup codes are single-use fallback credentials. Generation and matching
//! live here as pure functions; the storage layer is responsible for making
//! the find-and-remove atomic per user (row lock).

use anyhow::{Result, anyhow};
use rand::{RngCore, rngs::OsRng};
use totp_rs::{Algorithm, Secret, TOTP};

const TOTP_DIGITS: usize = 6;
const TOTP_STEP_SECONDS: u64 = 30;
/// Accept the current step plus one step of clock drift either side.
const TOTP_SKEW_STEPS: u8 = 1;

pub const BACKUP_CODE_COUNT: usize = 10;
const BACKUP_CODE_BYTES: usize = 4;

/// Stateless TOTP operations bound to an issuer label for enrollment URIs.
#[derive(Clone, Debug)]
pub struct TotpEngine {
    issuer: String,
}

impl TotpEngine {
    #[must_use]
    pub fn new(issuer: String) -> Self {
        Self { issuer }
    }

    /// Generate a fresh cryptographically random secret, base32 encoded.
    #[must_use]
    pub fn generate_secret() -> String {
        // to_encoded always yields the Encoded variant.
        match Secret::generate_secret().to_encoded() {
            Secret::Encoded(value) => value,
            Secret::Raw(_) => String::new(),
        }
    }

    /// Build the otpauth provisioning URI and a QR code data URL for
    /// authenticator enrollment.
    ///
    /// # Errors
    /// Returns an error if the secret is not valid base32 or QR rendering
    /// fails.
    pub fn provisioning(&self, secret_base32: &str, account: &str) -> Result<(String, String)> {
        let totp = self.build(secret_base32, account)?;
        let uri = totp.get_url();
        let qr = totp
            .get_qr_base64()
            .map_err(|e| anyhow!("QR gen error: {e}"))?;
        Ok((uri, format!("data:image/png;base64,{qr}")))
    }

    /// Check a submitted code against the secret for the current time,
    /// tolerating one step of drift. Any malformed secret verifies as false.
    #[must_use]
    pub fn verify_code(&self, secret_base32: &str, code: &str) -> bool {
        let Ok(totp) = self.build(secret_base32, "user") else {
            return false;
        };
        totp.check_current(code).unwrap_or(false)
    }

    fn build(&self, secret_base32: &str, account: &str) -> Result<TOTP> {
        let secret_bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| anyhow!("invalid TOTP secret: {e:?}"))?;
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW_STEPS,
            TOTP_STEP_SECONDS,
            secret_bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| anyhow!("TOTP init error: {e}"))
    }
}

/// Generate a batch of single-use backup codes (fixed-length hex).
#[must_use]
pub fn generate_backup_codes(count: usize) -> Vec<String> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| {
            let mut raw = [0u8; BACKUP_CODE_BYTES];
            rng.fill_bytes(&mut raw);
            raw.iter().map(|byte| format!("{byte:02x}")).collect()
        })
        .collect()
}

/// Find-and-remove a backup code. Returns the remaining list when the code
/// matched, `None` otherwise. Exactly one occurrence is removed.
#[must_use]
pub fn consume_backup_code(codes: &[String], submitted: &str) -> Option<Vec<String>> {
    let position = codes.iter().position(|code| code == submitted)?;
    let mut remaining = codes.to_vec();
    remaining.remove(position);
    Some(remaining)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{
        BACKUP_CODE_COUNT, TOTP_SKEW_STEPS, TotpEngine, consume_backup_code, generate_backup_codes,
    };
    use std::time::{SystemTime, UNIX_EPOCH};
    use totp_rs::{Algorithm, Secret, TOTP};

    fn engine() -> TotpEngine {
        TotpEngine::new("Custodia".to_string())
    }

    fn raw_totp(secret_base32: &str) -> TOTP {
        TOTP::new(
            Algorithm::SHA1,
            6,
            TOTP_SKEW_STEPS,
            30,
            Secret::Encoded(secret_base32.to_string()).to_bytes().unwrap(),
            Some("Custodia".to_string()),
            "user".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn generated_secret_is_base32() {
        let secret = TotpEngine::generate_secret();
        assert!(!secret.is_empty());
        assert!(
            secret
                .chars()
                .all(|ch| ch.is_ascii_uppercase() || ('2'..='7').contains(&ch))
        );
    }

    #[test]
    fn current_code_verifies() {
        let secret = TotpEngine::generate_secret();
        let code = raw_totp(&secret).generate_current().unwrap();
        assert!(engine().verify_code(&secret, &code));
    }

    #[test]
    fn drift_window_is_bounded() {
        let secret = TotpEngine::generate_secret();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // One step back is inside the window.
        let previous = raw_totp(&secret).generate(now - 30);
        assert!(engine().verify_code(&secret, &previous));

        // Three steps back is outside any configured window.
        let stale = raw_totp(&secret).generate(now - 90);
        assert!(!engine().verify_code(&secret, &stale));
    }

    #[test]
    fn wrong_code_and_bad_secret_fail_closed() {
        let secret = TotpEngine::generate_secret();
        assert!(!engine().verify_code(&secret, "000000"));
        assert!(!engine().verify_code("not base32!!", "123456"));
    }

    #[test]
    fn provisioning_uri_names_issuer_and_account() {
        let secret = TotpEngine::generate_secret();
        let (uri, qr) = engine().provisioning(&secret, "alice@example.com").unwrap();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Custodia"));
        assert!(qr.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn backup_codes_are_fixed_length_hex() {
        let codes = generate_backup_codes(BACKUP_CODE_COUNT);
        assert_eq!(codes.len(), BACKUP_CODE_COUNT);
        for code in &codes {
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|ch| ch.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn backup_code_consumed_at_most_once() {
        let codes = generate_backup_codes(BACKUP_CODE_COUNT);
        let code = codes.first().unwrap().clone();

        let remaining = consume_backup_code(&codes, &code).unwrap();
        assert_eq!(remaining.len(), BACKUP_CODE_COUNT - 1);

        // Second use of the same code against the updated list fails.
        assert!(consume_backup_code(&remaining, &code).is_none());
    }

    #[test]
    fn unknown_backup_code_leaves_list_untouched() {
        let codes = generate_backup_codes(3);
        assert!(consume_backup_code(&codes, "ffffffff").is_none());
        assert_eq!(codes.len(), 3);
    }
}
