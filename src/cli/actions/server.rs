use crate::{
    api::{
        self,
        email::{EmailSender, LogEmailSender},
        state::{AppState, AuthConfig},
    },
    auth::{token::TokenCodec, totp::TotpEngine},
    cache::MemoryCache,
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub signing_secret: SecretString,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub reset_ttl_minutes: u64,
    pub cookie_domain: Option<String>,
    pub frontend_url: String,
    pub totp_issuer: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let codec = TokenCodec::new(
        &args.signing_secret,
        args.access_ttl_minutes,
        args.refresh_ttl_days,
    );
    let totp = TotpEngine::new(args.totp_issuer.clone());

    let mut config =
        AuthConfig::new(args.frontend_url).with_reset_ttl_minutes(args.reset_ttl_minutes);
    if let Some(domain) = args.cookie_domain {
        config = config.with_cookie_domain(domain);
    }

    let sender: Arc<dyn EmailSender> = Arc::new(LogEmailSender);
    let state = Arc::new(AppState::new(
        config,
        codec,
        totp,
        Arc::new(MemoryCache::new()),
        sender,
    ));

    api::serve(args.port, args.dsn, state).await
}
