//! Backend server descriptors and the directory of live servers.
//!
//! [`Server`] is the immutable descriptor of one data-serving node;
//! its identity is the canonical [`host`](Server::host) string.
//! [`ServerDirectory`] is the gateway's read-only view of backend
//! membership — the directory itself is maintained externally, the
//! gateway only snapshots it per routing decision. [`ConfigDirectory`]
//! backs that view with the hot-reloadable config, so a config reload
//! is how membership changes reach the resolver.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::server::LoadedConfig;

fn default_scheme() -> String {
    "http".to_string()
}

fn is_default_scheme(s: &str) -> bool {
    s == "http"
}

/// One backend data-serving node. Immutable value object; two servers
/// with the same canonical host string are the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Server {
    #[serde(default = "default_scheme", skip_serializing_if = "is_default_scheme")]
    pub scheme: String,

    pub address: String,

    pub port: u16,
}

impl Server {
    #[must_use]
    pub fn new(scheme: &str, address: &str, port: u16) -> Self {
        Self {
            scheme: scheme.to_string(),
            address: address.to_string(),
            port,
        }
    }

    /// Canonical `address:port` string, bracketing IPv6 literals so the
    /// result is a valid URI authority.
    #[must_use]
    pub fn host(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

impl std::fmt::Display for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host())
    }
}

/// Read-only view of the live backend set.
///
/// Freshness is the directory implementation's concern; callers treat
/// every `list_servers` result as a point-in-time snapshot and never
/// hold it across membership changes.
// async_trait is required here because the directory is shared as
// Arc<dyn ServerDirectory> and native async fn in traits (Rust 1.75+)
// does not support dyn dispatch.
#[async_trait]
pub trait ServerDirectory: Send + Sync {
    async fn list_servers(&self) -> Vec<Server>;
}

/// Directory backed by the hot-reloadable gateway config.
pub struct ConfigDirectory {
    config: Arc<RwLock<LoadedConfig>>,
}

impl ConfigDirectory {
    #[must_use]
    pub fn new(config: Arc<RwLock<LoadedConfig>>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServerDirectory for ConfigDirectory {
    async fn list_servers(&self) -> Vec<Server> {
        self.config.read().await.config.servers.clone()
    }
}

/// Fixed directory over an in-memory server list.
pub struct StaticDirectory {
    servers: Vec<Server>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(servers: Vec<Server>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl ServerDirectory for StaticDirectory {
    async fn list_servers(&self) -> Vec<Server> {
        self.servers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_joins_address_and_port() {
        let server = Server::new("http", "localhost", 8083);
        assert_eq!(server.host(), "localhost:8083");
    }

    #[test]
    fn host_brackets_ipv6_literals() {
        let server = Server::new("http", "2a00:1450:4007:805::1007", 1234);
        assert_eq!(server.host(), "[2a00:1450:4007:805::1007]:1234");
    }

    #[test]
    fn host_leaves_bracketed_addresses_alone() {
        let server = Server::new("https", "[::1]", 9999);
        assert_eq!(server.host(), "[::1]:9999");
    }

    #[test]
    fn identity_is_the_host_string() {
        let a = Server::new("http", "data1", 8083);
        let b = Server::new("http", "data1", 8083);
        assert_eq!(a, b);
        assert_eq!(a.host(), b.host());
    }

    #[test]
    fn scheme_defaults_to_http_when_deserialized() {
        let server: Server =
            serde_json::from_str(r#"{"address": "data1", "port": 8083}"#).unwrap();
        assert_eq!(server.scheme, "http");
    }

    #[tokio::test]
    async fn static_directory_returns_its_servers() {
        let servers = vec![
            Server::new("http", "data1", 8083),
            Server::new("http", "data2", 8083),
        ];
        let directory = StaticDirectory::new(servers.clone());
        assert_eq!(directory.list_servers().await, servers);
    }
}
