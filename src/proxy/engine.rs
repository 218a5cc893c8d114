//! The streaming leg of the proxy: one request, one backend.
//!
//! [`forward`] hands the inbound body to the pooled hyper client and
//! resolves as soon as response headers arrive — the response body is
//! returned still-streaming, so neither side is ever held in memory
//! whole. The timeout covers only the window up to response headers;
//! once a status is committed downstream the stream either completes
//! or is aborted, it can no longer be retried.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method};
use hyper::body::Incoming;

use crate::directory::Server;
use crate::error::GatewayError;
use crate::proxy::uri::make_uri;
use crate::server::HttpClient;

/// Stream one request to `server` and return the upstream response with
/// its body unconsumed.
///
/// Dropping the returned future (caller disconnect) aborts the backend
/// request and releases the pooled connection; nothing keeps draining a
/// response nobody will read.
pub async fn forward(
    client: &HttpClient,
    server: &Server,
    path: &str,
    raw_query: Option<&str>,
    method: Method,
    headers: HeaderMap,
    body: Body,
    timeout: Duration,
) -> Result<hyper::Response<Incoming>, GatewayError> {
    let uri = make_uri(&server.scheme, &server.host(), path, raw_query)?;
    let target = uri.to_string();

    let mut builder = hyper::Request::builder().method(method).uri(uri);
    for (key, value) in &headers {
        builder = builder.header(key, value);
    }

    let request = builder.body(body).map_err(|e| GatewayError::Upstream {
        target: target.clone(),
        source: Box::new(e),
    })?;

    match tokio::time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(GatewayError::Upstream {
            target,
            source: Box::new(e),
        }),
        Err(_) => Err(GatewayError::Upstream {
            target,
            source: "timed out waiting for response headers".into(),
        }),
    }
}
