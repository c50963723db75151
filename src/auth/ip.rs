//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, connect_info::MockConnectInfo},
    http::request::Parts,
};

/// Header consulted when the server runs behind a trusted reverse proxy.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Trait for types that provide access to HTTP headers and extensions.
/// Implemented for both `Parts` and `Request` to allow flexible IP extraction.
pub trait HasHeadersAndExtensions {
    fn headers(&self) -> &axum::http::HeaderMap;
    fn extensions(&self) -> &axum::http::Extensions;
}

impl HasHeadersAndExtensions for Parts {
    fn headers(&self) -> &axum::http::HeaderMap {
        &self.headers
    }
    fn extensions(&self) -> &axum::http::Extensions {
        &self.extensions
    }
}

impl<B> HasHeadersAndExtensions for axum::extract::Request<B> {
    fn headers(&self) -> &axum::http::HeaderMap {
        axum::extract::Request::headers(self)
    }
    fn extensions(&self) -> &axum::http::Extensions {
        axum::extract::Request::extensions(self)
    }
}

/// Extract the client IP address.
///
/// With `trust_proxy` the first `X-Forwarded-For` entry is used and a missing
/// or malformed header is an error (no fallback to the socket address).
/// Otherwise the peer address from `ConnectInfo` is used.
pub fn extract_client_ip<T: HasHeadersAndExtensions>(
    source: &T,
    trust_proxy: bool,
) -> Result<String, &'static str> {
    if trust_proxy {
        let header_value = source
            .headers()
            .get(FORWARDED_FOR)
            .ok_or("IP header not present")?
            .to_str()
            .map_err(|_| "IP header contains invalid characters")?;
        let first = header_value
            .split(',')
            .next()
            .map(str::trim)
            .ok_or("IP header is empty")?;
        return first
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid address");
    }

    let extensions = source.extensions();
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .ok_or("No client IP available")
}
