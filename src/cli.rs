//! Command-line interface definitions using clap derive macros.
//!
//! A single flat [`Cli`] parser: listen address, log level and format,
//! and (with the `sentry-integration` feature) error tracking. Every
//! flag has an environment variable equivalent for container
//! deployments.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Forward HTTP proxy with CONNECT tunneling",
    after_help = "\x1b[1mExamples:\x1b[0m\n  \
        relay                                  Listen on 127.0.0.1:8080\n  \
        relay --addr 0.0.0.0:3128 --pretty     Listen on all interfaces\n  \
        curl -x http://127.0.0.1:8080 https://example.com"
)]
pub struct Cli {
    /// Listen address
    #[arg(short, long, env = "RELAY_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}
