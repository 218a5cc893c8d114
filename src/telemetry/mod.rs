//! Fire-and-forget metric emission and structured request logging.
//!
//! The gateway reports what it did through an [`Emitter`]; aggregation
//! and persistence live elsewhere. Both calls are synchronous,
//! infallible, and must never block the proxy path — the in-tree
//! [`TracingEmitter`] just hands everything to `tracing`.

/// Per-request metric events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    /// One single-routed request completed (or failed) against a target.
    RequestTime {
        target: String,
        latency_ms: u64,
        success: bool,
    },

    /// A broadcast was initiated to this many backends.
    BroadcastDispatched { servers: usize },

    /// One broadcast leg failed; isolated, never surfaced to the caller.
    BroadcastDeliveryFailed { target: String, error: String },
}

/// One structured request-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub correlation_id: String,
    pub remote_addr: String,
    pub identity: String,
    pub method: String,
    pub path: String,
    /// Resolved target host, or `None` when resolution itself failed.
    pub target: Option<String>,
    pub status: u16,
    pub latency_ms: u64,
}

pub trait Emitter: Send + Sync {
    fn emit(&self, event: MetricEvent);
    fn log(&self, record: RequestRecord);
}

/// Emits everything through the `tracing` subscriber.
pub struct TracingEmitter;

impl Emitter for TracingEmitter {
    fn emit(&self, event: MetricEvent) {
        match event {
            MetricEvent::RequestTime {
                target,
                latency_ms,
                success,
            } => {
                tracing::debug!(target_host = %target, latency_ms, success, "request timed");
            }
            MetricEvent::BroadcastDispatched { servers } => {
                tracing::debug!(servers, "broadcast dispatched");
            }
            MetricEvent::BroadcastDeliveryFailed { target, error } => {
                tracing::debug!(target_host = %target, error = %error, "broadcast delivery failed");
            }
        }
    }

    fn log(&self, record: RequestRecord) {
        tracing::info!(
            correlation_id = %record.correlation_id,
            remote_addr = %record.remote_addr,
            identity = %record.identity,
            method = %record.method,
            path = %record.path,
            target = record.target.as_deref().unwrap_or("-"),
            status = record.status,
            latency_ms = record.latency_ms,
            "request"
        );
    }
}

/// Discards everything. Useful in tests asserting gateway behavior
/// without a subscriber.
pub struct NoopEmitter;

impl Emitter for NoopEmitter {
    fn emit(&self, _event: MetricEvent) {}
    fn log(&self, _record: RequestRecord) {}
}
