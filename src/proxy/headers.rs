//! Hop-by-hop stripping and `X-Forwarded-For` chaining.
//!
//! [`strip_hop_by_hop`] is applied separately to the outbound request and
//! to the origin's response. [`append_forwarded_for`] folds any existing
//! forwarding chain into a single value and appends the caller.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

/// Headers meaningful only for a single transport leg.
///
/// `Trailers` is matched literally; it is not the standard `Trailer` field.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    HeaderName::from_static("trailers"),
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

/// The caller's host with the port removed, or `None` when the caller
/// address is unknown.
#[must_use]
pub fn caller_host(remote: Option<SocketAddr>) -> Option<String> {
    remote.map(|addr| addr.ip().to_string())
}

pub fn append_forwarded_for(headers: &mut HeaderMap, caller_host: &str) {
    // Prior values are joined byte for byte; they need not be valid UTF-8.
    let mut chain = Vec::new();
    for value in headers.get_all(&X_FORWARDED_FOR) {
        chain.extend_from_slice(value.as_bytes());
        chain.extend_from_slice(b", ");
    }
    chain.extend_from_slice(caller_host.as_bytes());

    match HeaderValue::from_bytes(&chain) {
        Ok(val) => {
            headers.insert(X_FORWARDED_FOR, val);
        }
        Err(e) => {
            tracing::warn!(error = %e, "unrepresentable X-Forwarded-For chain, leaving header as is");
        }
    }
}
