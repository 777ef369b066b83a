//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output (for
//! production) or pretty-printed output (for TTY / local dev). Format
//! is auto-detected from the terminal but can be forced via `--json`
//! or `--pretty`.
//!
//! The HTTP plumbing crates log every connection at `debug`/`trace`; their
//! targets are capped at `warn` so `--log-level debug` stays readable.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

const NOISY_TARGETS: [&str; 3] = ["hyper", "hyper_util", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[must_use]
pub fn build_filter(level: &LogLevel) -> Targets {
    let level = level.to_tracing_level();
    // Level ordering is inverted: TRACE > WARN means "more verbose".
    let noisy = if level > Level::WARN { Level::WARN } else { level };

    NOISY_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |filter, target| {
            filter.with_target(*target, noisy)
        })
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = build_filter(level);

    #[cfg(feature = "sentry-integration")]
    let sentry_layer = Some(sentry_tracing::layer());
    #[cfg(not(feature = "sentry-integration"))]
    let sentry_layer: Option<tracing_subscriber::layer::Identity> = None;

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .with(sentry_layer)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .with(sentry_layer)
                .init();
        }
    }
}
