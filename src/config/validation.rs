//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`GatewayConfig`] for
//! structural errors such as missing routes, bad prefixes, duplicate
//! entries, unsupported schemes, and malformed backend addresses.
//! Returns a list of [`ValidationError`] values with per-field
//! suggestions.

use url::Url;

use super::model::GatewayConfig;
use crate::error::ValidationError;

/// Validate a single route prefix. Returns `Ok(())` or a human-readable error.
pub fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() {
        return Err("prefix cannot be empty".into());
    }
    if !prefix.starts_with('/') {
        return Err(format!(
            "prefix must start with '/' (did you mean '/{prefix}'?)"
        ));
    }
    if prefix.len() > 1 && prefix.ends_with('/') {
        return Err("prefix must not end with '/'".into());
    }
    Ok(())
}

/// Validate a rewrite target. Returns `Ok(())` or a human-readable error.
pub fn validate_rewrite(rewrite: &str) -> Result<(), String> {
    if rewrite.is_empty() || rewrite.starts_with('/') {
        Ok(())
    } else {
        Err(format!(
            "rewrite must be empty or start with '/' (did you mean '/{rewrite}'?)"
        ))
    }
}

/// Validate one backend server entry by constructing its base URL.
pub fn validate_server(scheme: &str, host: &str, port: u16) -> Result<(), String> {
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if port == 0 {
        return Err("port cannot be 0".into());
    }
    match Url::parse(&format!("{scheme}://{host}/")) {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("'{host}' is not a valid host")),
    }
}

pub fn validate(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Auth: both username and password must be set together
    let auth = &config.auth;
    match (&auth.username, &auth.password) {
        (Some(u), Some(p)) => {
            if u.is_empty() {
                errors.push(ValidationError {
                    section: "(root)".into(),
                    field: "auth.username".into(),
                    message: "username cannot be empty when auth is configured".into(),
                    suggestion: None,
                });
            }
            if p.is_empty() {
                errors.push(ValidationError {
                    section: "(root)".into(),
                    field: "auth.password".into(),
                    message: "password cannot be empty when auth is configured".into(),
                    suggestion: None,
                });
            }
        }
        (Some(_), None) => {
            errors.push(ValidationError {
                section: "(root)".into(),
                field: "auth.password".into(),
                message: "password is required when username is set".into(),
                suggestion: None,
            });
        }
        (None, Some(_)) => {
            errors.push(ValidationError {
                section: "(root)".into(),
                field: "auth.username".into(),
                message: "username is required when password is set".into(),
                suggestion: None,
            });
        }
        (None, None) => {}
    }

    if config.defaults.broadcast_body_limit == 0 {
        errors.push(ValidationError {
            section: "(root)".into(),
            field: "defaults.broadcast_body_limit".into(),
            message: "broadcast body limit must be greater than 0".into(),
            suggestion: None,
        });
    }

    if config.routes.is_empty() {
        errors.push(ValidationError {
            section: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_prefixes = std::collections::HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let route_id = if route.prefix.is_empty() {
            format!("routes[{i}]")
        } else {
            route.prefix.clone()
        };

        if let Err(msg) = validate_prefix(&route.prefix) {
            errors.push(ValidationError {
                section: route_id.clone(),
                field: "prefix".into(),
                message: msg,
                suggestion: if !route.prefix.is_empty() && !route.prefix.starts_with('/') {
                    Some(format!("did you mean '/{}'?", route.prefix))
                } else {
                    None
                },
            });
        }

        if !seen_prefixes.insert(&route.prefix) {
            errors.push(ValidationError {
                section: route_id.clone(),
                field: "prefix".into(),
                message: "duplicate route prefix".into(),
                suggestion: None,
            });
        }

        if let Err(msg) = validate_rewrite(&route.rewrite) {
            errors.push(ValidationError {
                section: route_id.clone(),
                field: "rewrite".into(),
                message: msg,
                suggestion: None,
            });
        }
    }

    let mut seen_hosts = std::collections::HashSet::new();

    for server in &config.servers {
        let server_id = server.host();

        if let Err(msg) = validate_server(&server.scheme, &server.host(), server.port) {
            errors.push(ValidationError {
                section: server_id.clone(),
                field: "servers".into(),
                message: msg,
                suggestion: None,
            });
        }

        if !seen_hosts.insert(server_id.clone()) {
            errors.push(ValidationError {
                section: server_id,
                field: "servers".into(),
                message: "duplicate server host".into(),
                suggestion: None,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &GatewayConfig) -> String {
    let mut lines = vec![format!(
        "  {} routes, {} servers\n",
        config.routes.len(),
        config.server_count()
    )];

    for route in &config.routes {
        let rewrite = if route.rewrite.is_empty() {
            "(prefix stripped)".to_string()
        } else {
            route.rewrite.clone()
        };
        lines.push(format!(
            "  {}  -> {rewrite} [{:?}]",
            route.prefix, route.mode
        ));
    }

    for server in &config.servers {
        lines.push(format!("  backend: {server}"));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{AuthConfig, Defaults, GatewayConfig, RouteMode, RouteRule};
    use crate::directory::Server;

    fn minimal_config() -> GatewayConfig {
        GatewayConfig {
            defaults: Defaults::default(),
            routes: vec![
                RouteRule {
                    prefix: "/proxy".into(),
                    mode: RouteMode::Default,
                    rewrite: String::new(),
                },
                RouteRule {
                    prefix: "/druid/v2".into(),
                    mode: RouteMode::Query,
                    rewrite: "/druid/v2".into(),
                },
            ],
            servers: vec![Server::new("http", "localhost", 8083)],
            auth: AuthConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn empty_routes_fails() {
        let mut config = minimal_config();
        config.routes.clear();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one route"));
    }

    #[test]
    fn empty_servers_is_allowed() {
        // Zero backends is a runtime 503 condition, not a config error.
        let mut config = minimal_config();
        config.servers.clear();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn prefix_without_slash_fails() {
        let mut config = minimal_config();
        config.routes[0].prefix = "proxy".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/proxy'?")));
    }

    #[test]
    fn duplicate_prefix_fails() {
        let mut config = minimal_config();
        config.routes[1].prefix = "/proxy".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate route")));
    }

    #[test]
    fn bad_rewrite_fails() {
        let mut config = minimal_config();
        config.routes[1].rewrite = "druid".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "rewrite"));
    }

    #[test]
    fn unsupported_scheme_fails() {
        let mut config = minimal_config();
        config.servers[0].scheme = "ftp".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("unsupported scheme")));
    }

    #[test]
    fn zero_port_fails() {
        let mut config = minimal_config();
        config.servers[0].port = 0;
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("port")));
    }

    #[test]
    fn duplicate_server_host_fails() {
        let mut config = minimal_config();
        let duplicate = config.servers[0].clone();
        config.servers.push(duplicate);
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate server")));
    }

    #[test]
    fn username_without_password_fails() {
        let mut config = minimal_config();
        config.auth.username = Some("admin".into());
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "auth.password"));
    }
}
