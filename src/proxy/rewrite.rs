//! Route prefix matching and path rewriting.
//!
//! [`match_route`] picks the configured route whose prefix covers the
//! request path, longest prefix first. [`rewrite_path`] is the pure
//! mapping from `(original path, matched prefix)` to the backend-facing
//! path: the prefix is replaced by the route's rewrite target, or
//! stripped entirely when the target is empty.

use crate::config::model::RouteRule;

/// Longest matching prefix wins. A prefix matches only at a segment
/// boundary: `/druid/v2` covers `/druid/v2` and `/druid/v2/abc` but
/// not `/druid/v2abc`.
#[must_use]
pub fn match_route<'a>(routes: &'a [RouteRule], path: &str) -> Option<&'a RouteRule> {
    routes
        .iter()
        .filter(|route| prefix_matches(&route.prefix, path))
        .max_by_key(|route| route.prefix.len())
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Replace the matched prefix with the rewrite target. The result may
/// be empty (prefix stripped, nothing left); the URI builder normalizes
/// that to `/`.
#[must_use]
pub fn rewrite_path(path: &str, prefix: &str, target: &str) -> String {
    let rest = path.strip_prefix(prefix).unwrap_or(path);
    format!("{target}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RouteMode;

    fn route(prefix: &str, rewrite: &str) -> RouteRule {
        RouteRule {
            prefix: prefix.into(),
            mode: RouteMode::Default,
            rewrite: rewrite.into(),
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let routes = vec![route("/druid", "/a"), route("/druid/v2", "/b")];
        let matched = match_route(&routes, "/druid/v2/datasources").unwrap();
        assert_eq!(matched.prefix, "/druid/v2");
    }

    #[test]
    fn prefix_requires_segment_boundary() {
        let routes = vec![route("/druid/v2", "/b")];
        assert!(match_route(&routes, "/druid/v2abc").is_none());
        assert!(match_route(&routes, "/druid/v2").is_some());
        assert!(match_route(&routes, "/druid/v2/abc").is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let routes = vec![route("/proxy", "")];
        assert!(match_route(&routes, "/other").is_none());
    }

    #[test]
    fn rewrite_replaces_prefix() {
        assert_eq!(
            rewrite_path("/druid/v2/datasources", "/druid/v2", "/default"),
            "/default/datasources"
        );
    }

    #[test]
    fn empty_target_strips_prefix() {
        assert_eq!(rewrite_path("/proxy/status", "/proxy", ""), "/status");
        assert_eq!(rewrite_path("/proxy", "/proxy", ""), "");
    }

    #[test]
    fn identity_rewrite_preserves_path() {
        assert_eq!(
            rewrite_path("/druid/v2/abc", "/druid/v2", "/druid/v2"),
            "/druid/v2/abc"
        );
    }
}
