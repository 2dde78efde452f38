//! Device metadata recorded with each session.
//!
//! Best-effort parsing of `User-Agent`; unknown agents leave fields unset
//! rather than guessing. The client IP prefers `x-forwarded-for` (first hop)
//! since the service normally sits behind a proxy.

use axum::http::{HeaderMap, header::USER_AGENT};
use std::net::SocketAddr;

#[derive(Debug, Default, Clone)]
pub(super) struct DeviceMetadata {
    pub(super) device_name: Option<String>,
    pub(super) device_type: Option<String>,
    pub(super) browser: Option<String>,
    pub(super) operating_system: Option<String>,
    pub(super) ip_address: Option<String>,
}

impl DeviceMetadata {
    pub(super) fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let user_agent = headers.get(USER_AGENT).and_then(|value| value.to_str().ok());

        let ip_address = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .or_else(|| peer.map(|addr| addr.ip().to_string()));

        let (device_type, browser, operating_system) = match user_agent {
            Some(ua) => (
                Some(device_type(ua).to_string()),
                browser(ua).map(str::to_string),
                operating_system(ua).map(str::to_string),
            ),
            None => (None, None, None),
        };

        let device_name = match (&browser, &operating_system) {
            (Some(browser), Some(os)) => Some(format!("{browser} on {os}")),
            (Some(browser), None) => Some(browser.clone()),
            (None, Some(os)) => Some(os.clone()),
            (None, None) => None,
        };

        Self {
            device_name,
            device_type,
            browser,
            operating_system,
            ip_address,
        }
    }
}

fn device_type(user_agent: &str) -> &'static str {
    let ua = user_agent.to_lowercase();
    if ua.contains("ipad") || ua.contains("tablet") {
        "tablet"
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        "mobile"
    } else {
        "desktop"
    }
}

fn browser(user_agent: &str) -> Option<&'static str> {
    // Order matters: Edge and Chrome both advertise "Chrome", Chrome and
    // Safari both advertise "Safari".
    if user_agent.contains("Edg/") {
        Some("Edge")
    } else if user_agent.contains("Firefox/") {
        Some("Firefox")
    } else if user_agent.contains("Chrome/") {
        Some("Chrome")
    } else if user_agent.contains("Safari/") {
        Some("Safari")
    } else {
        None
    }
}

fn operating_system(user_agent: &str) -> Option<&'static str> {
    if user_agent.contains("Windows") {
        Some("Windows")
    } else if user_agent.contains("Android") {
        Some("Android")
    } else if user_agent.contains("iPhone") || user_agent.contains("iPad") {
        Some("iOS")
    } else if user_agent.contains("Mac OS X") {
        Some("macOS")
    } else if user_agent.contains("Linux") {
        Some("Linux")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceMetadata;
    use axum::http::{HeaderMap, HeaderValue, header::USER_AGENT};

    const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const PHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn desktop_chrome_on_windows() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_UA));
        let device = DeviceMetadata::from_request(&headers, None);

        assert_eq!(device.device_type.as_deref(), Some("desktop"));
        assert_eq!(device.browser.as_deref(), Some("Chrome"));
        assert_eq!(device.operating_system.as_deref(), Some("Windows"));
        assert_eq!(device.device_name.as_deref(), Some("Chrome on Windows"));
    }

    #[test]
    fn iphone_safari() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(PHONE_UA));
        let device = DeviceMetadata::from_request(&headers, None);

        assert_eq!(device.device_type.as_deref(), Some("mobile"));
        assert_eq!(device.browser.as_deref(), Some("Safari"));
        assert_eq!(device.operating_system.as_deref(), Some("iOS"));
    }

    #[test]
    fn forwarded_for_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer = "192.0.2.1:443".parse().ok();
        let device = DeviceMetadata::from_request(&headers, peer);
        assert_eq!(device.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn unknown_agent_leaves_fields_unset() {
        let device = DeviceMetadata::from_request(&HeaderMap::new(), None);
        assert!(device.device_name.is_none());
        assert!(device.browser.is_none());
        assert!(device.ip_address.is_none());
    }
}
