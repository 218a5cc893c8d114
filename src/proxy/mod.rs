//! Core HTTP request forwarding handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every non-`/status` request, runs the security gate, resolves the
//! target backend(s), and delegates to the streaming engine or the
//! broadcast dispatcher. Submodules handle target URI construction
//! ([`uri`]), prefix matching and rewriting ([`rewrite`]), header
//! construction ([`headers`]), the streaming leg ([`engine`]), and
//! fire-and-forget fan-out ([`broadcast`]).

pub mod broadcast;
pub mod engine;
pub mod headers;
pub mod rewrite;
pub mod uri;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::routing::{QueryContext, RoutingDecision};
use crate::security::{self, Action, Resource};
use crate::server::AppState;
use crate::telemetry::{MetricEvent, RequestRecord};

#[allow(clippy::too_many_lines, clippy::cast_possible_truncation)]
pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let raw_query = parts.uri.query().map(str::to_string);
    let method = parts.method.clone();

    let correlation_id = parts
        .headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    // Clone the Arc<GatewayConfig> (cheap refcount bump) to release the RwLock before .await
    let (config, route) = {
        let loaded = state.config.read().await;
        let config = Arc::clone(&loaded.config);

        let Some(route) = rewrite::match_route(&config.routes, &path) else {
            tracing::warn!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                "no route matched"
            );
            return StatusCode::NOT_FOUND.into_response();
        };
        let route = route.clone();

        (config, route)
    };

    // Security gate: nothing reaches a backend before both halves pass.
    let resource = Resource {
        prefix: route.prefix.clone(),
        action: Action::from_method(&method),
    };
    let identity = match security::enforce(
        state.authenticator.as_ref(),
        state.authorizer.as_ref(),
        &parts.headers,
        &resource,
    ) {
        Ok(identity) => identity,
        Err(denied) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                denied = ?denied,
                "access denied"
            );
            return denied.into_response();
        }
    };

    let ctx = QueryContext::from_request(&parts.headers, raw_query.as_deref());
    let start = Instant::now();

    let decision = match state.resolver.decide(&route, &method, &ctx).await {
        Ok(decision) => decision,
        Err(e) => {
            let status = e.response_status();
            tracing::error!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                error = %e,
                "routing failed"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            state.emitter.log(RequestRecord {
                correlation_id,
                remote_addr: addr.ip().to_string(),
                identity: identity.name,
                method: method.to_string(),
                path,
                target: None,
                status: status.as_u16(),
                latency_ms: start.elapsed().as_millis() as u64,
            });
            return status.into_response();
        }
    };

    let client_ip = addr.ip().to_string();
    let rewritten = rewrite::rewrite_path(&path, &route.prefix, &route.rewrite);

    match decision {
        RoutingDecision::AllHosts(servers) => {
            // Replaying one body to N backends is the one case that
            // needs buffering; administrative requests are small.
            let limit = config.defaults.broadcast_body_limit;
            let body = match axum::body::to_bytes(body, limit).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        error = %e,
                        "broadcast body rejected"
                    );
                    return StatusCode::PAYLOAD_TOO_LARGE.into_response();
                }
            };

            let dispatched = broadcast::broadcast(
                &state,
                broadcast::BroadcastRequest {
                    servers,
                    method: method.clone(),
                    path: rewritten,
                    raw_query,
                    original_headers: parts.headers,
                    body,
                    defaults: config.defaults.clone(),
                    client_ip,
                    correlation_id: correlation_id.clone(),
                },
            );

            state.stats.broadcasts.fetch_add(1, Ordering::Relaxed);
            state.emitter.log(RequestRecord {
                correlation_id,
                remote_addr: addr.ip().to_string(),
                identity: identity.name,
                method: method.to_string(),
                path,
                target: Some(format!("{dispatched} hosts")),
                status: StatusCode::OK.as_u16(),
                latency_ms: start.elapsed().as_millis() as u64,
            });

            (
                StatusCode::OK,
                Json(serde_json::json!({ "dispatched": dispatched })),
            )
                .into_response()
        }

        RoutingDecision::SingleHost(server) => {
            let forwarded_headers = headers::build_forwarded_headers(
                &parts.headers,
                &client_ip,
                &server,
                &config.defaults,
                &correlation_id,
            );

            let result = engine::forward(
                &state.http_client,
                &server,
                &rewritten,
                raw_query.as_deref(),
                method.clone(),
                forwarded_headers,
                body,
                Duration::from_millis(config.defaults.timeout),
            )
            .await;

            let latency_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(upstream) => {
                    state.stats.forwarded.fetch_add(1, Ordering::Relaxed);

                    let (mut resp_parts, incoming) = upstream.into_parts();
                    headers::strip_response_hop_by_hop(&mut resp_parts.headers);
                    if let Ok(val) = HeaderValue::from_str(&correlation_id) {
                        resp_parts.headers.insert("x-correlation-id", val);
                    }

                    state.emitter.emit(MetricEvent::RequestTime {
                        target: server.host(),
                        latency_ms,
                        success: true,
                    });
                    state.emitter.log(RequestRecord {
                        correlation_id,
                        remote_addr: client_ip,
                        identity: identity.name,
                        method: method.to_string(),
                        path,
                        target: Some(server.host()),
                        status: resp_parts.status.as_u16(),
                        latency_ms,
                    });

                    // Latency to headers only — the body is still
                    // streaming from the backend at this point.
                    Response::from_parts(resp_parts, Body::new(incoming))
                }
                Err(e) => {
                    let status = e.response_status();
                    tracing::error!(
                        correlation_id = %correlation_id,
                        target = %server,
                        error = %e,
                        "upstream request failed"
                    );
                    state.stats.failed.fetch_add(1, Ordering::Relaxed);
                    state.emitter.emit(MetricEvent::RequestTime {
                        target: server.host(),
                        latency_ms,
                        success: false,
                    });
                    state.emitter.log(RequestRecord {
                        correlation_id,
                        remote_addr: client_ip,
                        identity: identity.name,
                        method: method.to_string(),
                        path,
                        target: Some(server.host()),
                        status: status.as_u16(),
                        latency_ms,
                    });
                    status.into_response()
                }
            }
        }
    }
}
