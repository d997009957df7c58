//! Client address resolution for rate limiting and audit fields.
//!
//! Order: `Fly-Client-IP`, then the last entry of `X-Forwarded-For`, then
//! `X-Real-IP`, then the TCP peer address, else `"unknown"`.
//!
//! Earlier `X-Forwarded-For` entries are whatever the client sent; only the
//! hop appended by the edge proxy is used.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

/// Placeholder when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client address from proxy headers or the peer socket.
#[must_use]
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let parse = |s: &str| s.trim().parse::<IpAddr>().ok();

    header("fly-client-ip")
        .and_then(parse)
        .or_else(|| header("x-forwarded-for").and_then(|s| s.rsplit(',').next()).and_then(parse))
        .or_else(|| header("x-real-ip").and_then(parse))
        .or_else(|| peer.map(|addr| addr.ip()))
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |ip| ip.to_string())
}

/// Extractor for the resolved client address.
///
/// Never rejects; falls back to `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self(resolve_client_ip(&parts.headers, peer)))
    }
}
