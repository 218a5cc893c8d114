//! Host resolution over the live directory snapshot.
//!
//! [`HostResolver`] owns the directory handle and the injected
//! [`SelectionPolicy`]; every operation re-reads the snapshot, so a
//! decision can only ever reference hosts the directory currently
//! knows. With zero known servers every operation fails explicitly —
//! the gateway translates that into 503 rather than forwarding to a
//! null target.

use std::sync::Arc;

use axum::http::Method;

use crate::config::model::{RouteMode, RouteRule};
use crate::directory::{Server, ServerDirectory};
use crate::error::GatewayError;
use crate::routing::balancer;
use crate::routing::context::QueryContext;
use crate::routing::policy::SelectionPolicy;

/// Where one request goes. Produced per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    SingleHost(Server),
    AllHosts(Vec<Server>),
}

pub struct HostResolver {
    directory: Arc<dyn ServerDirectory>,
    policy: Box<dyn SelectionPolicy>,
}

impl HostResolver {
    #[must_use]
    pub fn new(directory: Arc<dyn ServerDirectory>, policy: Box<dyn SelectionPolicy>) -> Self {
        Self { directory, policy }
    }

    /// One server for a routable query. A stateful-connection
    /// identifier overrides the policy and routes through the
    /// rendezvous balancer, so session state survives repeated calls.
    pub async fn resolve_for_query(&self, ctx: &QueryContext) -> Result<Server, GatewayError> {
        let servers = self.directory.list_servers().await;

        if let Some(connection_id) = ctx.connection_id.as_deref() {
            return balancer::assign(connection_id, &servers).cloned();
        }

        self.policy
            .pick(ctx, &servers)
            .cloned()
            .ok_or(GatewayError::NoAvailableBackend)
    }

    /// A server for requests lacking routable identity (generic proxy
    /// paths). Never fails while at least one server is known.
    pub async fn resolve_default(&self) -> Result<Server, GatewayError> {
        let servers = self.directory.list_servers().await;
        self.policy
            .pick(&QueryContext::default(), &servers)
            .cloned()
            .ok_or(GatewayError::NoAvailableBackend)
    }

    /// The full de-duplicated current server set, for broadcast
    /// dispatch.
    pub async fn resolve_all(&self) -> Result<Vec<Server>, GatewayError> {
        let mut seen = std::collections::HashSet::new();
        let servers: Vec<Server> = self
            .directory
            .list_servers()
            .await
            .into_iter()
            .filter(|s| seen.insert(s.host()))
            .collect();

        if servers.is_empty() {
            return Err(GatewayError::NoAvailableBackend);
        }
        Ok(servers)
    }

    /// Routing decision for a matched route: administrative DELETEs
    /// under a query route fan out to every host, everything else goes
    /// to exactly one.
    pub async fn decide(
        &self,
        route: &RouteRule,
        method: &Method,
        ctx: &QueryContext,
    ) -> Result<RoutingDecision, GatewayError> {
        match route.mode {
            RouteMode::Query if *method == Method::DELETE => {
                Ok(RoutingDecision::AllHosts(self.resolve_all().await?))
            }
            RouteMode::Query => Ok(RoutingDecision::SingleHost(
                self.resolve_for_query(ctx).await?,
            )),
            RouteMode::Default => Ok(RoutingDecision::SingleHost(self.resolve_default().await?)),
        }
    }
}
