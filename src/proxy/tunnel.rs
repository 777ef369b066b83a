//! `CONNECT` tunneling.
//!
//! The handler moves the connection's upgrade handle out of the request,
//! dials the target, and answers `200 Connection Established` or
//! `502 Bad Gateway`. Once hyper has flushed the 200, the upgrade resolves
//! to the raw client stream and two independent tasks copy bytes in each
//! direction. The tunneled payload is never inspected.
//!
//! ```text
//! AwaitingDial ──dial err──▶ Failed (502, closed)
//!      │
//!      └──dial ok──▶ Established ──upgrade──▶ Relaying ──EOF/err──▶ Closed
//! ```

use axum::extract::Request;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper::ext::ReasonPhrase;
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::error::RelayError;

/// Port dialed when a `CONNECT` target names none.
pub const DEFAULT_PORT: u16 = 80;

pub const ESTABLISHED_REASON: &[u8] = b"Connection Established";

pub async fn handle(mut req: Request) -> Response {
    // From here on the connection belongs to the tunnel, not to HTTP.
    let Some(on_upgrade) = req.extensions_mut().remove::<OnUpgrade>() else {
        // hyper only hands over the raw stream for a method spelled exactly
        // `CONNECT`; other spellings still arrive here as tunnel requests.
        tracing::warn!(
            method = %req.method(),
            "method is not the canonical CONNECT spelling, connection cannot be taken over"
        );
        return bad_gateway();
    };

    let target = match resolve_target(req.uri()) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting tunnel");
            return bad_gateway();
        }
    };

    let origin = match dial(&target).await {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(error = %e, "tunnel dial failed");
            return bad_gateway();
        }
    };

    tracing::info!(target = %target, "tunnel established");

    tokio::spawn(
        async move {
            match on_upgrade.await.map_err(RelayError::from) {
                Ok(upgraded) => relay(TokioIo::new(upgraded), origin),
                Err(e) => tracing::warn!(error = %e, "tunnel abandoned before relay"),
            }
        }
        .in_current_span(),
    );

    established()
}

/// The `host:port` to dial for a `CONNECT` target.
pub fn resolve_target(uri: &Uri) -> Result<String, RelayError> {
    let authority = uri
        .authority()
        .filter(|a| !a.host().is_empty())
        .ok_or_else(|| RelayError::InvalidTarget(uri.to_string()))?;

    let host = authority.host();
    let port = authority.port_u16().unwrap_or(DEFAULT_PORT);

    if host.contains(':') && !host.starts_with('[') {
        Ok(format!("[{host}]:{port}"))
    } else {
        Ok(format!("{host}:{port}"))
    }
}

pub async fn dial(target: &str) -> Result<TcpStream, RelayError> {
    TcpStream::connect(target)
        .await
        .map_err(|source| RelayError::Dial {
            target: target.to_string(),
            source,
        })
}

/// Start both relay directions and return without waiting for either.
///
/// Each direction shuts down its own write half once its source reaches
/// EOF or fails; the other direction keeps running until it sees the
/// same on its own source.
pub fn relay<C>(client: C, origin: TcpStream)
where
    C: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (origin_read, origin_write) = origin.into_split();

    tokio::spawn(pipe(client_read, origin_write, "client->origin").in_current_span());
    tokio::spawn(pipe(origin_read, client_write, "origin->client").in_current_span());
}

async fn pipe<R, W>(mut from: R, mut to: W, direction: &'static str)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match tokio::io::copy(&mut from, &mut to).await {
        Ok(bytes) => tracing::debug!(direction, bytes, "relay finished"),
        Err(e) => tracing::warn!(direction, error = %e, "relay interrupted"),
    }

    if let Err(e) = to.shutdown().await {
        tracing::debug!(direction, error = %e, "shutdown after relay failed");
    }
}

fn established() -> Response {
    let mut response = StatusCode::OK.into_response();
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(ESTABLISHED_REASON));
    response
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, [(header::CONNECTION, "close")]).into_response()
}
