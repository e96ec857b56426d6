//! Client address resolution.
//!
//! Security: forwarding headers are supplied by the client and are not validated
//! in any way. They are only consulted when `trust_proxy` is enabled, which is
//! correct only behind a reverse proxy that strips or overwrites them. With the
//! switch off (the default) the socket peer address is used.

use std::net::SocketAddr;

use http::HeaderMap;

/// Headers consulted after the configured one, in priority order.
/// `HeaderMap` lookups are case-insensitive, so one entry covers every casing.
const FORWARDING_HEADERS: [&str; 3] = ["x-forwarded-for", "cf-connecting-ip", "x-real-ip"];

/// Settings for client address resolution, borrowed from the configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpSettings<'a> {
    /// Header checked first
    pub proxy_header: &'a str,
    /// Whether forwarding headers are consulted at all
    pub trust_proxy: bool,
    /// Returned when nothing else yields an address
    pub fallback: &'a str,
}

/// Resolve the caller's address.
///
/// Order: configured header, `x-forwarded-for`, `cf-connecting-ip`, `x-real-ip`
/// (first comma-separated token of each, only when trusted), then the socket
/// peer, then the fallback.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    settings: &ClientIpSettings<'_>,
) -> String {
    if settings.trust_proxy {
        if let Some(ip) = first_token(headers, settings.proxy_header) {
            return ip;
        }
        for name in FORWARDING_HEADERS {
            if let Some(ip) = first_token(headers, name) {
                return ip;
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| settings.fallback.to_string())
}

fn first_token(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    let token = value.split(',').next()?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
