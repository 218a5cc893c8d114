//! Integration tests for config loading across all file formats.

use querygate::config::model::{GatewayConfig, RouteMode};
use querygate::config::sources::parse_config_str;
use querygate::config::validation::validate;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("querygate.yaml");
    let config = parse_config_str("yaml", &content, "querygate.yaml").unwrap();
    validate(&config).unwrap();
    assert!(!config.routes.is_empty());
    assert!(config.server_count() > 0);
}

#[test]
fn yaml_full_example_loads_and_validates() {
    let content = load_example("full.yaml");
    let config = parse_config_str("yaml", &content, "full.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.routes.len() >= 3);
    assert_eq!(config.server_count(), 3);
    assert!(config.auth.username.is_some());
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("querygate.json");
    let config = parse_config_str("json", &content, "querygate.json").unwrap();
    validate(&config).unwrap();
    assert!(!config.routes.is_empty());
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("querygate.toml");
    let config = parse_config_str("toml", &content, "querygate.toml").unwrap();
    validate(&config).unwrap();
    assert!(!config.routes.is_empty());
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml_config =
        parse_config_str("yaml", &load_example("querygate.yaml"), "yaml").unwrap();
    let json_config =
        parse_config_str("json", &load_example("querygate.json"), "json").unwrap();
    let toml_config =
        parse_config_str("toml", &load_example("querygate.toml"), "toml").unwrap();

    assert_eq!(yaml_config.routes.len(), json_config.routes.len());
    assert_eq!(yaml_config.routes.len(), toml_config.routes.len());
    assert_eq!(yaml_config.server_count(), json_config.server_count());
    assert_eq!(yaml_config.server_count(), toml_config.server_count());

    assert_eq!(yaml_config.routes[0].prefix, json_config.routes[0].prefix);
    assert_eq!(yaml_config.routes[0].prefix, toml_config.routes[0].prefix);
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(result.is_err());
}

#[test]
fn invalid_config_fails_validation() {
    let empty = r#"{"routes": []}"#;
    let config: GatewayConfig = serde_json::from_str(empty).unwrap();
    assert!(validate(&config).is_err());
}

#[test]
fn route_mode_defaults_to_generic_proxy() {
    let json = r#"{
        "routes": [{"prefix": "/proxy"}],
        "servers": [{"address": "localhost", "port": 8083}]
    }"#;
    let config: GatewayConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.routes[0].mode, RouteMode::Default);
    assert!(config.routes[0].rewrite.is_empty());
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{
        "routes": [{"prefix": "/proxy", "target": "oops"}],
        "servers": []
    }"#;
    assert!(serde_json::from_str::<GatewayConfig>(json).is_err());
}
