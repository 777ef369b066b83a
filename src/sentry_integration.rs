//! Optional Sentry error tracking integration.
//!
//! Initializes the Sentry SDK with the provided DSN and environment.
//! Error-level tracing events (failed upstream requests, interrupted
//! relays) reach Sentry through the `sentry-tracing` layer installed in
//! [`logging::init`](crate::logging::init). The returned guard must be
//! held for the lifetime of the process.

pub fn init(dsn: &str, environment: Option<&str>) -> sentry::ClientInitGuard {
    let dsn = dsn
        .parse::<sentry::types::Dsn>()
        .map_err(|e| tracing::warn!(error = %e, "invalid Sentry DSN, error tracking disabled"))
        .ok();

    sentry::init(sentry::ClientOptions {
        dsn,
        environment: environment.map(|e| e.to_string().into()),
        release: Some(concat!("relay@", env!("CARGO_PKG_VERSION")).into()),
        ..Default::default()
    })
}
