//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        signing_secret: auth_opts.signing_secret,
        access_ttl_minutes: auth_opts.access_ttl_minutes,
        refresh_ttl_days: auth_opts.refresh_ttl_days,
        reset_ttl_minutes: auth_opts.reset_ttl_minutes,
        cookie_domain: auth_opts.cookie_domain,
        frontend_url: auth_opts.frontend_url,
        totp_issuer: auth_opts.totp_issuer,
    }))
}

#[cfg(test)]
mod tests {
    use super::handler;
    use crate::cli::{actions::Action, commands};

    #[test]
    fn matches_become_server_action() {
        let matches = commands::new().get_matches_from(vec![
            "custodia",
            "--dsn",
            "postgres://localhost/custodia",
            "--signing-secret",
            "s",
            "--port",
            "9999",
        ]);

        let Action::Server(args) = handler(&matches).expect("server action");
        assert_eq!(args.port, 9999);
        assert_eq!(args.dsn, "postgres://localhost/custodia");
        assert_eq!(args.frontend_url, "http://localhost:5173");
    }
}
