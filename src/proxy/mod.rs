//! Request dispatch for the forward proxy.
//!
//! [`proxy_handler`] is the Axum fallback that receives every request.
//! `CONNECT` requests go to the [`tunnel`] path, which takes over the
//! raw connection and relays opaque bytes; every other method goes to the
//! [`forward`] path, which re-issues the request to the origin with
//! [`headers`] sanitized and streams the response back.

pub mod forward;
pub mod headers;
pub mod tunnel;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use tracing::Instrument;

use crate::server::ProxyState;

/// Which path a request takes through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Tunnel,
    Forward,
}

impl Route {
    #[must_use]
    pub fn classify(method: &http::Method) -> Self {
        if method.as_str().eq_ignore_ascii_case("CONNECT") {
            Self::Tunnel
        } else {
            Self::Forward
        }
    }
}

pub async fn proxy_handler(State(state): State<Arc<ProxyState>>, req: Request) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("request", id = %request_id);

    async move {
        tracing::info!(
            method = %req.method(),
            target = %req.uri(),
            remote = ?remote,
            "incoming request"
        );

        match Route::classify(req.method()) {
            Route::Tunnel => tunnel::handle(req).await,
            Route::Forward => forward::handle(&state.http_client, req, remote).await,
        }
    }
    .instrument(span)
    .await
}
