//! Unified error type for relay.
//!
//! [`RelayError`] covers startup failures (bind, I/O) as well as the
//! per-request failures of the forward and tunnel paths. Per-request
//! errors never escape the request's own task: the handlers turn them
//! into a 500/502 response or a log record.

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("invalid tunnel target: '{0}'")]
    InvalidTarget(String),

    #[error("failed to dial {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection upgrade failed: {0}")]
    Upgrade(#[from] hyper::Error),
}
