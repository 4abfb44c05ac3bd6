//! Client identification utilities
//!
//! Functions for identifying clients via HTTP headers behind proxies and CDNs.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr};

use crate::crypto::sha256_hex;

/// Headers consulted for the client address, in priority order.
///
/// `X-Forwarded-For` may carry a list; only its first entry is used.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Address reported when nothing usable is found
pub const UNKNOWN_CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Extract client IP address from headers
///
/// Checks `CF-Connecting-IP`, `X-Forwarded-For` and `X-Real-IP` first
/// (for CDN / reverse proxy setups), then falls back to the direct
/// connection IP. Values that do not parse as an IP address are skipped.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or `0.0.0.0` if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> IpAddr {
    CLIENT_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .find_map(|value| value.split(',').next()?.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
        .unwrap_or(UNKNOWN_CLIENT_IP)
}

/// Stable, non-reversible key for a client address
///
/// Used to name rate-limit records without storing raw addresses.
pub fn client_key(ip: &IpAddr) -> String {
    sha256_hex(ip.to_string().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, "192.168.1.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.7"));

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        headers.insert("x-real-ip", HeaderValue::from_static("2001:db8::1"));

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct)), direct);
        assert_eq!(extract_client_ip(&headers, None), UNKNOWN_CLIENT_IP);
    }

    #[test]
    fn test_client_key_is_hashed() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let key = client_key(&ip);
        assert_eq!(key.len(), 64);
        assert_ne!(key, ip.to_string());
        assert_eq!(key, client_key(&ip));
    }
}
