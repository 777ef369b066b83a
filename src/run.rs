//! Process entry for the proxy.
//!
//! Initializes logging (and Sentry when enabled), builds the shared
//! outbound client, binds the listener, and serves until Ctrl+C or
//! SIGTERM.

use std::sync::Arc;

use crate::cli::Cli;
use crate::error::RelayError;
use crate::logging;
use crate::server::{self, ProxyState};

pub async fn execute(cli: Cli) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(cli.pretty, cli.json);
    logging::init(&cli.log_level, log_format);

    #[cfg(feature = "sentry-integration")]
    let _sentry_guard = cli
        .sentry_dsn
        .as_ref()
        .map(|dsn| crate::sentry_integration::init(dsn, cli.sentry_environment.as_deref()));

    let state = Arc::new(ProxyState::new(server::build_http_client()));
    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.addr).await?;

    tracing::info!(
        listen = %cli.addr,
        version = env!("CARGO_PKG_VERSION"),
        "starting proxy"
    );

    if let Err(e) = server::serve(listener, router, server::shutdown_signal()).await {
        tracing::error!(error = %e, "server stopped with error");
        return Err(e);
    }

    tracing::info!("proxy stopped");
    Ok(())
}
