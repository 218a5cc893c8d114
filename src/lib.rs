//! Querygate is the broker-tier gateway of a segment-oriented analytical
//! data store.
//!
//! It is the single HTTP entry point in front of a fleet of data-serving
//! nodes: each incoming request is authenticated, matched against a
//! configured path prefix, routed to one backend (or broadcast to all of
//! them for administrative deletes), and proxied asynchronously — request
//! and response bodies stream through without being buffered in memory.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Configuration loading, validation, and hot-reloading via the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`directory`] -- The [`Server`](directory::Server) descriptor and the
//!   [`ServerDirectory`](directory::ServerDirectory) view of live backends.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Core forwarding: target URI construction, prefix rewriting,
//!   the streaming proxy engine, and the broadcast dispatcher.
//! - [`routing`] -- Host resolution: selection policies, the rendezvous-hash
//!   connection balancer, and per-request query context.
//! - [`security`] -- Authentication and authorization enforced before any
//!   backend is contacted.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//! - [`status`] -- `GET /status` endpoint handler returning runtime diagnostics.
//! - [`telemetry`] -- Fire-and-forget metric emission and request logging.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod server;
pub mod status;
pub mod telemetry;
