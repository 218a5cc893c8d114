//! Pluggable single-server selection policies.
//!
//! The resolver picks one backend for a routable query through a
//! [`SelectionPolicy`]; the concrete strategy is injected at startup
//! rather than baked in, so deployments can swap it without touching
//! the resolver.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::directory::Server;
use crate::routing::balancer;
use crate::routing::context::QueryContext;

pub trait SelectionPolicy: Send + Sync {
    /// Pick one server from a non-empty snapshot. `None` only when the
    /// snapshot is empty.
    fn pick<'a>(&self, ctx: &QueryContext, servers: &'a [Server]) -> Option<&'a Server>;
}

/// Rotate through the snapshot, ignoring query identity.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionPolicy for RoundRobin {
    fn pick<'a>(&self, _ctx: &QueryContext, servers: &'a [Server]) -> Option<&'a Server> {
        if servers.is_empty() {
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % servers.len();
        servers.get(index)
    }
}

/// Pin each data source to a server via rendezvous hashing, so repeated
/// queries against one data source hit a warm cache. Requests without a
/// declared data source fall back to round-robin.
#[derive(Debug, Default)]
pub struct DataSourceAffinity {
    fallback: RoundRobin,
}

impl DataSourceAffinity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionPolicy for DataSourceAffinity {
    fn pick<'a>(&self, ctx: &QueryContext, servers: &'a [Server]) -> Option<&'a Server> {
        match ctx.data_source.as_deref() {
            Some(data_source) => balancer::assign(data_source, servers).ok(),
            None => self.fallback.pick(ctx, servers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers() -> Vec<Server> {
        vec![
            Server::new("http", "data1", 8083),
            Server::new("http", "data2", 8083),
            Server::new("http", "data3", 8083),
        ]
    }

    #[test]
    fn round_robin_rotates() {
        let policy = RoundRobin::new();
        let servers = servers();
        let ctx = QueryContext::default();

        let picks: Vec<String> = (0..3)
            .map(|_| policy.pick(&ctx, &servers).unwrap().host())
            .collect();
        assert_eq!(picks[0], "data1:8083");
        assert_eq!(picks[1], "data2:8083");
        assert_eq!(picks[2], "data3:8083");
        assert_eq!(policy.pick(&ctx, &servers).unwrap().host(), "data1:8083");
    }

    #[test]
    fn round_robin_returns_none_on_empty_set() {
        let policy = RoundRobin::new();
        assert!(policy.pick(&QueryContext::default(), &[]).is_none());
    }

    #[test]
    fn affinity_is_stable_per_data_source() {
        let policy = DataSourceAffinity::new();
        let servers = servers();
        let ctx = QueryContext {
            data_source: Some("events".into()),
            connection_id: None,
        };

        let first = policy.pick(&ctx, &servers).unwrap().clone();
        for _ in 0..20 {
            assert_eq!(*policy.pick(&ctx, &servers).unwrap(), first);
        }
    }

    #[test]
    fn affinity_falls_back_to_round_robin_without_data_source() {
        let policy = DataSourceAffinity::new();
        let servers = servers();
        let ctx = QueryContext::default();

        let a = policy.pick(&ctx, &servers).unwrap().host();
        let b = policy.pick(&ctx, &servers).unwrap().host();
        assert_ne!(a, b);
    }
}
