//! Host resolution for inbound requests.
//!
//! [`HostResolver`] turns a per-request [`QueryContext`] into a
//! [`RoutingDecision`] over the current directory snapshot. Submodules
//! hold the pluggable selection policies ([`policy`]), the rendezvous
//! connection balancer ([`balancer`]), and the query-context extraction
//! ([`context`]).

pub mod balancer;
pub mod context;
pub mod policy;
pub mod resolver;

pub use context::QueryContext;
pub use resolver::{HostResolver, RoutingDecision};
