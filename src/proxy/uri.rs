//! Target URI construction.
//!
//! [`make_uri`] is the one place outbound URIs come from: it takes the
//! backend's scheme and canonical host, the (already rewritten) path,
//! and the inbound request's raw query string, and produces a valid
//! absolute `http::Uri`. The raw query arrives percent-encoded from the
//! inbound request and is passed through byte-for-byte — re-encoding it
//! would corrupt escapes the caller already applied.

use axum::http::Uri;

use crate::error::GatewayError;

/// Build the absolute URI for one outbound request.
///
/// `host_and_port` accepts `host`, `host:port`, a bracketed
/// `[v6]:port`, or an unbracketed IPv6 literal whose final
/// colon-separated token is the port; the latter is bracketed on the
/// way out so the authority stays parseable. `raw_query = None` yields
/// no `?` at all. An empty path normalizes to `/`.
pub fn make_uri(
    scheme: &str,
    host_and_port: &str,
    path: &str,
    raw_query: Option<&str>,
) -> Result<Uri, GatewayError> {
    let authority = format_authority(host_and_port);

    let path = if path.is_empty() { "/" } else { path };
    let path_and_query = match raw_query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };

    Uri::builder()
        .scheme(scheme)
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .map_err(|source| GatewayError::InvalidTargetUri {
            authority,
            path: path.to_string(),
            source,
        })
}

/// Bracket unbracketed IPv6 literals exactly once.
///
/// Inputs with at most one colon are `host` or `host:port` and pass
/// through, as does anything already bracketed. With two or more
/// colons, a trailing all-digit token is split off as the port.
fn format_authority(host_and_port: &str) -> String {
    if host_and_port.starts_with('[') || host_and_port.matches(':').count() <= 1 {
        return host_and_port.to_string();
    }

    match host_and_port.rsplit_once(':') {
        Some((address, port))
            if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("[{address}]:{port}")
        }
        _ => format!("[{host_and_port}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_host_passes_through() {
        assert_eq!(format_authority("localhost"), "localhost");
        assert_eq!(format_authority("localhost:1234"), "localhost:1234");
    }

    #[test]
    fn ipv6_with_port_gets_bracketed() {
        assert_eq!(
            format_authority("2a00:1450:4007:805::1007:1234"),
            "[2a00:1450:4007:805::1007]:1234"
        );
    }

    #[test]
    fn bracketed_input_is_not_double_bracketed() {
        assert_eq!(
            format_authority("[2a00:1450:4007:805::1007]:1234"),
            "[2a00:1450:4007:805::1007]:1234"
        );
    }

    #[test]
    fn portless_ipv6_gets_bracketed_whole() {
        assert_eq!(format_authority("fe80::1:zzz"), "[fe80::1:zzz]");
    }

    #[test]
    fn empty_path_becomes_root() {
        let uri = make_uri("http", "localhost:1234", "", None).unwrap();
        assert_eq!(uri.path(), "/");
    }

    #[test]
    fn bad_scheme_is_a_construction_error() {
        assert!(matches!(
            make_uri("not a scheme", "localhost", "/", None),
            Err(GatewayError::InvalidTargetUri { .. })
        ));
    }
}
