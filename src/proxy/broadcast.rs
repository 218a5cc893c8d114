//! Fire-and-forget fan-out of administrative requests.
//!
//! Certain operations (delete-by-identifier and friends) have
//! node-local effects and must reach every backend, not one. Each
//! delivery runs as a detached task: the caller's response is
//! synthesized as soon as dispatch has been initiated to all known
//! hosts, and one backend's failure never affects the others. Failures
//! surface through telemetry and the log only — never to the caller,
//! and never as a retry.
//!
//! **Shutdown behavior:** delivery tasks may be cancelled by the Tokio
//! runtime during graceful shutdown before completing. Broadcast
//! delivery is best-effort.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use http_body_util::BodyExt;

use crate::config::model::Defaults;
use crate::directory::Server;
use crate::proxy::{engine, headers};
use crate::server::AppState;
use crate::telemetry::MetricEvent;

pub struct BroadcastRequest {
    pub servers: Vec<Server>,
    pub method: Method,
    pub path: String,
    pub raw_query: Option<String>,
    pub original_headers: HeaderMap,
    /// Buffered administrative body — the one place the gateway
    /// buffers, since the same bytes are replayed to every backend.
    pub body: Bytes,
    pub defaults: Defaults,
    pub client_ip: String,
    pub correlation_id: String,
}

/// Spawn one detached delivery per server and return how many were
/// dispatched. Does not wait for any backend acknowledgment.
#[allow(clippy::cast_possible_truncation)]
pub fn broadcast(state: &Arc<AppState>, request: BroadcastRequest) -> usize {
    let dispatched = request.servers.len();
    let timeout = Duration::from_millis(request.defaults.timeout);

    for server in request.servers {
        let forwarded_headers = headers::build_forwarded_headers(
            &request.original_headers,
            &request.client_ip,
            &server,
            &request.defaults,
            &request.correlation_id,
        );

        let state = Arc::clone(state);
        let method = request.method.clone();
        let path = request.path.clone();
        let raw_query = request.raw_query.clone();
        let body = request.body.clone();
        let correlation_id = request.correlation_id.clone();

        tokio::spawn(async move {
            let start = Instant::now();

            let result = engine::forward(
                &state.http_client,
                &server,
                &path,
                raw_query.as_deref(),
                method,
                forwarded_headers,
                Body::from(body),
                timeout,
            )
            .await;

            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(response) => {
                    let status = response.status();
                    // Drain the (small) acknowledgment so the pooled
                    // connection can be reused.
                    let _ = response.into_body().collect().await;
                    tracing::info!(
                        correlation_id = %correlation_id,
                        target = %server,
                        status = status.as_u16(),
                        latency_ms,
                        "broadcast target responded"
                    );
                }
                Err(e) => {
                    state.emitter.emit(MetricEvent::BroadcastDeliveryFailed {
                        target: server.host(),
                        error: e.to_string(),
                    });
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        target = %server,
                        error = %e,
                        latency_ms,
                        "broadcast target failed"
                    );
                }
            }
        });
    }

    state
        .emitter
        .emit(MetricEvent::BroadcastDispatched { servers: dispatched });
    dispatched
}
