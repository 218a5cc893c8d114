//! Header construction, forwarding, and hop-by-hop stripping.
//!
//! [`build_forwarded_headers`] clones the original client headers (when
//! forwarding is enabled), strips hop-by-hop headers, rewrites `Host`
//! to the target backend, and adds proxy metadata (`X-Forwarded-For`,
//! `X-Real-IP`, `Via`, `X-Correlation-Id`). Response headers pass
//! through verbatim apart from hop-by-hop fields — the body is streamed,
//! so `Content-Length` from the backend stays accurate and is kept.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderValue};
use hyper::header::HeaderName;

use crate::config::model::Defaults;
use crate::directory::Server;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Strip hop-by-hop headers from an upstream response.
///
/// `Transfer-Encoding` is per-leg framing and is re-applied by hyper on
/// the inbound leg; everything else, `Content-Length` included, streams
/// through untouched.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    client_ip: &str,
    target: &Server,
    defaults: &Defaults,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = if defaults.forward_headers {
        original.clone()
    } else {
        HeaderMap::new()
    };

    // Strip hop-by-hop
    if defaults.strip_hop_by_hop {
        for header_name in HOP_BY_HOP.iter() {
            headers.remove(header_name);
        }
    }

    // Rewrite Host to the resolved backend
    if let Ok(val) = HeaderValue::from_str(&target.host()) {
        headers.insert("host", val);
    }

    if defaults.proxy_headers {
        // X-Forwarded-For: append to chain
        let xff = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || client_ip.to_string(),
                |existing| format!("{existing}, {client_ip}"),
            );
        if let Ok(val) = HeaderValue::from_str(&xff) {
            headers.insert("x-forwarded-for", val);
        }

        // X-Real-IP (first IP in chain)
        let real_ip = xff.split(',').next().unwrap_or(client_ip).trim();
        if let Ok(val) = HeaderValue::from_str(real_ip) {
            headers.insert("x-real-ip", val);
        }

        // X-Forwarded-Proto
        let proto = if target.scheme == "https" {
            "https"
        } else {
            "http"
        };
        if let Ok(val) = HeaderValue::from_str(proto) {
            headers.insert("x-forwarded-proto", val);
        }

        // X-Forwarded-Host (original Host the client targeted)
        if let Some(original_host) = original.get("host") {
            headers.insert("x-forwarded-host", original_host.clone());
        }

        // Via
        if let Ok(val) = HeaderValue::from_str("1.1 querygate") {
            headers.insert("via", val);
        }

        // Correlation ID
        if let Ok(val) = HeaderValue::from_str(correlation_id) {
            headers.insert("x-correlation-id", val);
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Server {
        Server::new("http", "data1", 8083)
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = build_forwarded_headers(
            &original,
            "10.0.0.1",
            &target(),
            &Defaults::default(),
            "test-id",
        );

        assert!(result.get("connection").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn rewrites_host_to_backend() {
        let result = build_forwarded_headers(
            &HeaderMap::new(),
            "10.0.0.1",
            &target(),
            &Defaults::default(),
            "test-id",
        );

        assert_eq!(result.get("host").unwrap(), "data1:8083");
    }

    #[test]
    fn appends_x_forwarded_for() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-for", "1.2.3.4".parse().unwrap());

        let result = build_forwarded_headers(
            &original,
            "10.0.0.1",
            &target(),
            &Defaults::default(),
            "test-id",
        );

        assert_eq!(result.get("x-forwarded-for").unwrap(), "1.2.3.4, 10.0.0.1");
    }

    #[test]
    fn sets_correlation_id() {
        let result = build_forwarded_headers(
            &HeaderMap::new(),
            "10.0.0.1",
            &target(),
            &Defaults::default(),
            "my-correlation-id",
        );

        assert_eq!(result.get("x-correlation-id").unwrap(), "my-correlation-id");
    }

    #[test]
    fn response_strip_keeps_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "1234".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("connection", "close".parse().unwrap());

        strip_response_hop_by_hop(&mut headers);

        assert!(headers.get("content-length").is_some());
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get("connection").is_none());
    }
}
