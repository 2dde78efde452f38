//! Auth configuration and shared application state.

use crate::api::email::EmailSender;
use crate::auth::{token::TokenCodec, totp::TotpEngine};
use crate::cache::SecretCache;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_RESET_TTL_MINUTES: u64 = 15;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_url: String,
    cookie_domain: Option<String>,
    reset_ttl: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_url: String) -> Self {
        Self {
            frontend_url,
            cookie_domain: None,
            reset_ttl: Duration::from_secs(DEFAULT_RESET_TTL_MINUTES * 60),
        }
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: String) -> Self {
        self.cookie_domain = Some(domain);
        self
    }

    #[must_use]
    pub fn with_reset_ttl_minutes(mut self, minutes: u64) -> Self {
        self.reset_ttl = Duration::from_secs(minutes * 60);
        self
    }

    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    #[must_use]
    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    #[must_use]
    pub fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    #[must_use]
    pub fn reset_ttl_minutes(&self) -> u64 {
        self.reset_ttl.as_secs() / 60
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Process-wide state shared across request handlers. The codec and its
/// signing secret are read-only after startup.
pub struct AppState {
    config: AuthConfig,
    codec: TokenCodec,
    totp: TotpEngine,
    cache: Arc<dyn SecretCache>,
    mailer: Arc<dyn EmailSender>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        codec: TokenCodec,
        totp: TotpEngine,
        cache: Arc<dyn SecretCache>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            codec,
            totp,
            cache,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn totp(&self) -> &TotpEngine {
        &self.totp
    }

    #[must_use]
    pub fn cache(&self) -> &dyn SecretCache {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> Arc<dyn EmailSender> {
        self.mailer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::AuthConfig;

    #[test]
    fn config_defaults_and_overrides() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        assert!(!config.cookie_secure());
        assert!(config.cookie_domain().is_none());
        assert_eq!(config.reset_ttl_minutes(), 15);

        let config = config
            .with_cookie_domain(".example.com".to_string())
            .with_reset_ttl_minutes(5);
        assert_eq!(config.cookie_domain(), Some(".example.com"));
        assert_eq!(config.reset_ttl_minutes(), 5);
    }

    #[test]
    fn https_frontend_makes_cookies_secure() {
        let config = AuthConfig::new("https://app.example.com".to_string());
        assert!(config.cookie_secure());
    }
}
