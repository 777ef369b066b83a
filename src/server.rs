//! Axum server setup, shared proxy state, and graceful shutdown.
//!
//! Contains [`ProxyState`] (the `Arc`-shared state holding the outbound
//! HTTP client), [`build_router`] for constructing the Axum router with
//! its trace layer, [`build_http_client`] for the outbound hyper client,
//! [`serve`] for running the accept loop, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::proxy;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

/// State shared by every request-handling task. Built once at startup and
/// never mutated; the client is internally pooled and safe to share.
pub struct ProxyState {
    pub http_client: HttpClient,
}

impl ProxyState {
    #[must_use]
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(https)
}

/// Every request lands on the proxy handler, whatever its method or target
/// form (absolute-form for forwarding, authority-form for `CONNECT`).
pub fn build_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .fallback(proxy::proxy_handler)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// Connect info is attached to every request so the handlers can extend
/// `X-Forwarded-For` with the caller's address.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
