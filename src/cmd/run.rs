//! `querygate run` — start the gateway.
//!
//! Loads configuration from a file source, starts the Axum HTTP server
//! with graceful shutdown, and spawns a background refresh loop that
//! re-reads the config on an interval. The refresh loop is how backend
//! membership changes reach the resolver: a reload swaps the directory
//! snapshot without dropping in-flight requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::RunArgs;
use crate::config::{sources, ConfigSource};
use crate::error::GatewayError;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig};

pub async fn execute(args: RunArgs) -> Result<(), GatewayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_config_source(args.config.as_deref()).await?;
    let (mut config, version) = source.load().await?;

    // Apply CLI timeout override if it differs from the config default
    if args.timeout != config.defaults.timeout {
        config.defaults.timeout = args.timeout;
    }

    let route_count = config.routes.len();
    let server_count = config.server_count();

    let state = AppState::new(LoadedConfig {
        config: Arc::new(config),
        version,
        source_name: source.name().to_string(),
        loaded_at: Instant::now(),
    });

    // Shutdown signal: dropping shutdown_tx closes the channel and stops the refresh loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Spawn directory refresh loop with cancellation
    let refresh_state = Arc::clone(&state);
    let poll_interval = args.poll_interval;
    let refresh_handle = tokio::spawn(async move {
        directory_refresh_loop(refresh_state, source, poll_interval, shutdown_rx).await;
    });

    let router = server::build_router(state, args.max_body, args.max_in_flight);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        routes = route_count,
        servers = server_count,
        "querygate started"
    );

    // Wrap the shutdown signal to also stop the refresh loop immediately
    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown)
    .await?;

    // Wait for the refresh task to finish (catches panics)
    if let Err(e) = refresh_handle.await {
        tracing::error!(error = %e, "directory refresh task failed");
    }

    tracing::info!("querygate stopped");
    Ok(())
}

async fn resolve_config_source(
    explicit: Option<&std::path::Path>,
) -> Result<Box<dyn ConfigSource>, GatewayError> {
    if let Some(path) = explicit {
        return create_file_source(path);
    }

    // Auto-detect in current directory
    let candidates = [
        "querygate.yaml",
        "querygate.yml",
        "querygate.json",
        "querygate.toml",
    ];

    for name in &candidates {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    Err(GatewayError::NoConfigSource {
        hint: "Provide --config <file> or place querygate.yaml in the working directory.\n  \
               Run 'querygate init' to create a config file."
            .into(),
    })
}

fn create_file_source(path: &std::path::Path) -> Result<Box<dyn ConfigSource>, GatewayError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Box::new(sources::yaml::new(path.to_path_buf()))),

        #[cfg(feature = "json")]
        "json" => Ok(Box::new(sources::json::new(path.to_path_buf()))),

        #[cfg(feature = "toml")]
        "toml" => Ok(Box::new(sources::toml_source::new(path.to_path_buf()))),

        other => Err(GatewayError::UnsupportedFormat(other.to_string())),
    }
}

async fn directory_refresh_loop(
    state: Arc<AppState>,
    source: Box<dyn ConfigSource>,
    interval_secs: u64,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!("directory refresh loop shutting down");
                return;
            }
        }

        let current_version = {
            let config = state.config.read().await;
            config.version.clone()
        };

        match source.has_changed(&current_version).await {
            Ok(true) => {
                tracing::info!("config change detected, reloading");
                match source.load().await {
                    Ok((config, version)) => {
                        let server_count = config.server_count();
                        let mut loaded = state.config.write().await;
                        loaded.config = Arc::new(config);
                        loaded.version = version;
                        loaded.loaded_at = std::time::Instant::now();
                        drop(loaded);
                        state
                            .stats
                            .config_reloads
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        tracing::info!(servers = server_count, "directory reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "config reload failed, keeping current config");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "config change check failed");
            }
        }
    }
}
