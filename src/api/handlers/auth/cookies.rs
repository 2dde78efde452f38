//! Transport cookies for the token pair.
//!
//! Both tokens ride `HttpOnly` cookies scoped to `Path=/` with `SameSite=Lax`
//! and a `Max-Age` matching the token's own TTL. `Secure` is set only when
//! the frontend is served over HTTPS, `Domain` only when configured.

use crate::{api::state::AuthConfig, auth::token::TokenCodec};
use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
};

pub(super) const ACCESS_COOKIE: &str = "access_token";
pub(super) const REFRESH_COOKIE: &str = "refresh_token";

/// Set both auth cookies on a response header map.
pub(super) fn apply_auth_cookies(
    headers: &mut HeaderMap,
    config: &AuthConfig,
    codec: &TokenCodec,
    access_token: &str,
    refresh_token: &str,
) -> Result<(), InvalidHeaderValue> {
    let access = build_cookie(
        config,
        ACCESS_COOKIE,
        access_token,
        codec.access_ttl_seconds(),
    );
    let refresh = build_cookie(
        config,
        REFRESH_COOKIE,
        refresh_token,
        codec.refresh_ttl_seconds(),
    );
    headers.append(SET_COOKIE, HeaderValue::from_str(&access)?);
    headers.append(SET_COOKIE, HeaderValue::from_str(&refresh)?);
    Ok(())
}

/// Expire both auth cookies (logout).
pub(super) fn apply_clear_cookies(
    headers: &mut HeaderMap,
    config: &AuthConfig,
) -> Result<(), InvalidHeaderValue> {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let cookie = build_cookie(config, name, "", 0);
        headers.append(SET_COOKIE, HeaderValue::from_str(&cookie)?);
    }
    Ok(())
}

/// Read a cookie value from the request `Cookie` header.
pub(super) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn build_cookie(config: &AuthConfig, name: &str, value: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; Path=/; SameSite=Lax");
    cookie.push_str(&format!("; Max-Age={max_age_seconds}"));
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = config.cookie_domain() {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    cookie
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::{ACCESS_COOKIE, REFRESH_COOKIE, apply_auth_cookies, build_cookie, cookie_value};
    use crate::{api::state::AuthConfig, auth::token::TokenCodec};
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE};
    use secrecy::SecretString;

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:5173".to_string())
    }

    #[test]
    fn cookie_attributes() {
        let cookie = build_cookie(&config(), ACCESS_COOKIE, "tok", 1800);
        assert!(cookie.starts_with("access_token=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=1800"));
        // Plain http frontend never gets Secure.
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain"));
    }

    #[test]
    fn https_and_domain_attributes() {
        let config = AuthConfig::new("https://app.example.com".to_string())
            .with_cookie_domain(".example.com".to_string());
        let cookie = build_cookie(&config, REFRESH_COOKIE, "tok", 604_800);
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Domain=.example.com"));
    }

    #[test]
    fn both_cookies_set_with_matching_max_age() {
        let codec = TokenCodec::new(&SecretString::from("secret"), 30, 7);
        let mut headers = HeaderMap::new();
        apply_auth_cookies(&mut headers, &config(), &codec, "a", "r").unwrap();

        let cookies: Vec<_> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].contains("Max-Age=1800"));
        assert!(cookies[1].contains("Max-Age=604800"));
    }

    #[test]
    fn cookie_value_parses_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc; refresh_token=def"),
        );
        assert_eq!(
            cookie_value(&headers, "access_token").as_deref(),
            Some("abc")
        );
        assert_eq!(
            cookie_value(&headers, "refresh_token").as_deref(),
            Some("def")
        );
        assert!(cookie_value(&headers, "session").is_none());
    }
}
