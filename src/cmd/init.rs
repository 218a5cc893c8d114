//! `querygate init` — generate a starter configuration file.
//!
//! Writes a commented template config in the requested format. Refuses
//! to overwrite an existing file.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::GatewayError;

const YAML_TEMPLATE: &str = r#"# querygate configuration
#
# routes: inbound path prefixes and how they map to backends.
#   mode: default  -> generic proxy traffic, routed to one server
#   mode: query    -> query traffic, routed per query context;
#                     DELETEs under this prefix broadcast to every server
#   rewrite: backend-facing replacement for the prefix (empty = strip)
routes:
  - prefix: /proxy
    mode: default
  - prefix: /druid/v2
    mode: query
    rewrite: /druid/v2

# servers: the live backend set. Edit and the gateway picks it up on
# the next refresh interval without a restart.
servers:
  - address: localhost
    port: 8083
  - address: localhost
    port: 8084

# defaults:
#   timeout: 300000                  # ms to response headers
#   policy: round_robin              # or data_source_affinity
#   broadcast_body_limit: 4194304    # bytes

# auth:                              # uncomment to require Basic auth
#   username: admin
#   password: change-me
"#;

const JSON_TEMPLATE: &str = r#"{
  "routes": [
    { "prefix": "/proxy", "mode": "default" },
    { "prefix": "/druid/v2", "mode": "query", "rewrite": "/druid/v2" }
  ],
  "servers": [
    { "address": "localhost", "port": 8083 },
    { "address": "localhost", "port": 8084 }
  ]
}
"#;

const TOML_TEMPLATE: &str = r#"# querygate configuration

[[routes]]
prefix = "/proxy"
mode = "default"

[[routes]]
prefix = "/druid/v2"
mode = "query"
rewrite = "/druid/v2"

[[servers]]
address = "localhost"
port = 8083

[[servers]]
address = "localhost"
port = 8084
"#;

pub fn execute(args: &InitArgs) -> Result<(), GatewayError> {
    let path = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("querygate.{}", args.format.extension()))
    });

    if path.exists() {
        return Err(GatewayError::FileExists { path });
    }

    let content = match args.format {
        ConfigFormat::Yaml => YAML_TEMPLATE,
        ConfigFormat::Json => JSON_TEMPLATE,
        ConfigFormat::Toml => TOML_TEMPLATE,
    };

    std::fs::write(&path, content)?;

    println!("\u{2713} wrote {}", path.display());
    println!("  edit the server list, then: querygate run -c {}", path.display());
    Ok(())
}
