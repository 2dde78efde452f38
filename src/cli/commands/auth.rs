//! Token, cookie, and reset-flow arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SIGNING_SECRET: &str = "signing-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_SECRET)
                .long("signing-secret")
                .help("HS256 secret used to sign access and refresh tokens")
                .env("CUSTODIA_SIGNING_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("access-ttl-minutes")
                .long("access-ttl-minutes")
                .help("Access token TTL in minutes")
                .env("CUSTODIA_ACCESS_TTL_MINUTES")
                .default_value("30")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-ttl-days")
                .long("refresh-ttl-days")
                .help("Refresh token TTL in days")
                .env("CUSTODIA_REFRESH_TTL_DAYS")
                .default_value("7")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("reset-ttl-minutes")
                .long("reset-ttl-minutes")
                .help("Password reset token TTL in minutes")
                .env("CUSTODIA_RESET_TTL_MINUTES")
                .default_value("15")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("cookie-domain")
                .long("cookie-domain")
                .help("Domain attribute for auth cookies (host-only when unset)")
                .env("CUSTODIA_COOKIE_DOMAIN"),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Frontend base URL used for reset links and CORS")
                .env("CUSTODIA_FRONTEND_URL")
                .default_value("http://localhost:5173"),
        )
        .arg(
            Arg::new("totp-issuer")
                .long("totp-issuer")
                .help("Issuer label shown in authenticator apps")
                .env("CUSTODIA_TOTP_ISSUER")
                .default_value("Custodia"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub signing_secret: SecretString,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub reset_ttl_minutes: u64,
    pub cookie_domain: Option<String>,
    pub frontend_url: String,
    pub totp_issuer: String,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error when a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let signing_secret = matches
            .get_one::<String>(ARG_SIGNING_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --signing-secret")?;

        Ok(Self {
            signing_secret,
            access_ttl_minutes: matches
                .get_one::<i64>("access-ttl-minutes")
                .copied()
                .unwrap_or(30),
            refresh_ttl_days: matches
                .get_one::<i64>("refresh-ttl-days")
                .copied()
                .unwrap_or(7),
            reset_ttl_minutes: matches
                .get_one::<u64>("reset-ttl-minutes")
                .copied()
                .unwrap_or(15),
            cookie_domain: matches.get_one::<String>("cookie-domain").cloned(),
            frontend_url: matches
                .get_one::<String>("frontend-url")
                .cloned()
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            totp_issuer: matches
                .get_one::<String>("totp-issuer")
                .cloned()
                .unwrap_or_else(|| "Custodia".to_string()),
        })
    }
}
