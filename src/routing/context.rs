//! Per-request routing identity.
//!
//! The context is extracted from headers and the (already-encoded) query
//! string only — never from the request body, so the proxy path stays
//! streaming. Deployments whose clients carry routing identity inside a
//! request payload mirror it into the `X-Data-Source` /
//! `X-Connection-Id` headers at the client.

use axum::http::HeaderMap;

pub const DATA_SOURCE_HEADER: &str = "x-data-source";
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

const DATA_SOURCE_PARAM: &str = "dataSource";
const CONNECTION_ID_PARAM: &str = "connectionId";

/// Routing-relevant identity of one logical request. Created per inbound
/// request, discarded when the request completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Target data source, when the caller declared one.
    pub data_source: Option<String>,

    /// Stateful-connection identifier for sub-protocols that hold
    /// session state server-side (e.g. a SQL cursor protocol). Its
    /// presence routes the request through the connection balancer.
    pub connection_id: Option<String>,
}

impl QueryContext {
    #[must_use]
    pub fn from_request(headers: &HeaderMap, raw_query: Option<&str>) -> Self {
        Self {
            data_source: header_or_param(headers, DATA_SOURCE_HEADER, raw_query, DATA_SOURCE_PARAM),
            connection_id: header_or_param(
                headers,
                CONNECTION_ID_HEADER,
                raw_query,
                CONNECTION_ID_PARAM,
            ),
        }
    }
}

fn header_or_param(
    headers: &HeaderMap,
    header: &str,
    raw_query: Option<&str>,
    param: &str,
) -> Option<String> {
    if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    let raw_query = raw_query?;
    url::form_urlencoded::parse(raw_query.as_bytes())
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}
