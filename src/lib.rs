//! Relay is a forward HTTP proxy.
//!
//! Plain HTTP requests are re-issued to the origin named in their
//! absolute URI with hop-by-hop headers stripped and `X-Forwarded-For`
//! extended; the origin's response is streamed back. `CONNECT` requests
//! open an opaque TCP tunnel that relays bytes in both directions without
//! ever parsing them.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`error`] -- Unified error type using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Method dispatch, header sanitizing, forwarding, and
//!   `CONNECT` tunnels.
//! - [`run`] -- Process entry: logging, client construction, bind, serve.
//! - [`server`] -- Axum server setup, shared proxy state, outbound HTTP
//!   client, and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `sentry-integration` | Sentry error tracking |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod run;
pub mod server;

#[cfg(feature = "sentry-integration")]
pub mod sentry_integration;
