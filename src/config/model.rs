//! Serde data structures for the Querygate configuration file.
//!
//! Contains [`GatewayConfig`] (the root), [`RouteRule`], [`Defaults`],
//! and [`AuthConfig`]. All types derive `Serialize` and `Deserialize`
//! with `deny_unknown_fields` for strict parsing. The backend server
//! list reuses [`Server`](crate::directory::Server) directly — the
//! config file is the in-tree implementation of the server directory.

use serde::{Deserialize, Serialize};

use crate::directory::Server;

const fn default_timeout() -> u64 {
    300_000
}

const fn default_true() -> bool {
    true
}

const fn default_broadcast_body_limit() -> usize {
    4 * 1024 * 1024
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_default_broadcast_body_limit(v: &usize) -> bool {
    *v == default_broadcast_body_limit()
}

fn is_default_policy(v: &PolicyKind) -> bool {
    *v == PolicyKind::RoundRobin
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout()
        && v.forward_headers
        && v.proxy_headers
        && v.strip_hop_by_hop
        && v.policy == PolicyKind::RoundRobin
        && v.broadcast_body_limit == default_broadcast_body_limit()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    pub routes: Vec<RouteRule>,

    /// Live backend set. May be empty: the gateway starts and answers
    /// 503 until a config reload brings servers in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "AuthConfig::is_default")]
    pub auth: AuthConfig,
}

impl GatewayConfig {
    #[must_use]
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Upstream timeout in milliseconds, covering the window up to
    /// response headers. Generous by default — analytical queries run
    /// long.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub forward_headers: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub proxy_headers: bool,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub strip_hop_by_hop: bool,

    #[serde(default, skip_serializing_if = "is_default_policy")]
    pub policy: PolicyKind,

    /// Cap on a broadcast request body: the same bytes are replayed to
    /// every backend, so broadcasts are the one place the gateway
    /// buffers.
    #[serde(
        default = "default_broadcast_body_limit",
        skip_serializing_if = "is_default_broadcast_body_limit"
    )]
    pub broadcast_body_limit: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            forward_headers: default_true(),
            proxy_headers: default_true(),
            strip_hop_by_hop: default_true(),
            policy: PolicyKind::default(),
            broadcast_body_limit: default_broadcast_body_limit(),
        }
    }
}

/// Selection strategy for single-host query routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    RoundRobin,
    DataSourceAffinity,
}

/// How requests under one path prefix are routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Generic proxy traffic: always the default server.
    #[default]
    Default,

    /// Query traffic: routed per query context; DELETEs broadcast to
    /// every backend.
    Query,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRule {
    /// Inbound path prefix, e.g. `/proxy` or `/druid/v2`.
    pub prefix: String,

    #[serde(default, skip_serializing_if = "is_default_mode")]
    pub mode: RouteMode,

    /// Backend-facing replacement for the matched prefix. Empty strips
    /// the prefix entirely.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rewrite: String,
}

fn is_default_mode(v: &RouteMode) -> bool {
    *v == RouteMode::Default
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthConfig {
    pub(crate) fn is_default(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}
