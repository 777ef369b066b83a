//! Plain HTTP forwarding.
//!
//! The incoming request is turned into an outbound client request, sent
//! to the origin named by its absolute URI, and the origin's response is
//! streamed back. The status line and headers are committed before any
//! body byte; a failure after that point can only truncate the body.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Extensions, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;

use crate::error::RelayError;
use crate::server::HttpClient;

use super::headers::{append_forwarded_for, caller_host, strip_hop_by_hop};

pub const TRANSPORT_ERROR_BODY: &str = "Server Error performing request";

pub async fn handle(client: &HttpClient, req: Request, remote: Option<SocketAddr>) -> Response {
    let outbound = into_outbound(req, remote);
    let target = outbound.uri().clone();

    match client.request(outbound).await.map_err(RelayError::from) {
        Ok(response) => relay_response(response),
        Err(e) => {
            tracing::error!(target = %target, error = %e, "client request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, TRANSPORT_ERROR_BODY).into_response()
        }
    }
}

/// Rebuild an incoming request for the outbound client.
///
/// Extensions from the inbound connection (connect info, the upgrade
/// handle) are dropped and the version is reset so only the method, URI,
/// sanitized headers and body reach the client.
#[must_use]
pub fn into_outbound(req: Request, remote: Option<SocketAddr>) -> Request {
    let (mut parts, body) = req.into_parts();
    parts.extensions = Extensions::new();
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if let Some(host) = caller_host(remote) {
        append_forwarded_for(&mut parts.headers, &host);
    }

    Request::from_parts(parts, body)
}

fn relay_response(response: hyper::Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    tracing::info!(status = %parts.status, "response");

    strip_hop_by_hop(&mut parts.headers);

    // The body is polled by the server after this handler returns, outside
    // the request span.
    let span = tracing::Span::current();
    let body = body.map_err(move |e| {
        span.in_scope(|| tracing::error!(error = %e, "response body relay interrupted"));
        e
    });

    let mut relayed = Response::new(Body::new(body));
    *relayed.headers_mut() = parts.headers;
    *relayed.status_mut() = parts.status;
    relayed
}
