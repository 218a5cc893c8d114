//! `GET /status` endpoint handler.
//!
//! Returns a [`StatusResponse`] JSON payload containing the gateway
//! version, build metadata, uptime, config source metadata, loaded
//! route/server counts, and cumulative request statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub build: BuildInfo,
    pub config: ConfigStatus,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct BuildInfo {
    pub commit: String,
    pub profile: String,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigStatus {
    pub source: String,
    pub version: String,
    pub loaded_ago_seconds: u64,
    pub routes: usize,
    pub servers: usize,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
    pub broadcasts: u64,
    pub config_reloads: u64,
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    // Clone Arc<GatewayConfig> (cheap refcount bump) to release the lock quickly
    let (config, source_name, version_str, loaded_ago) = {
        let loaded = state.config.read().await;
        let config = Arc::clone(&loaded.config);
        let version_str = match &loaded.version {
            crate::config::ConfigVersion::Hash(h) => h.get(..8).unwrap_or(h).to_string(),
        };
        (
            config,
            loaded.source_name.clone(),
            version_str,
            loaded.loaded_at.elapsed().as_secs(),
        )
    };

    Json(StatusResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        build: BuildInfo {
            commit: env!("QUERYGATE_GIT_SHORT").to_string(),
            profile: env!("QUERYGATE_BUILD_PROFILE").to_string(),
        },
        config: ConfigStatus {
            source: source_name,
            version: version_str,
            loaded_ago_seconds: loaded_ago,
            routes: config.routes.len(),
            servers: config.server_count(),
        },
        stats: StatsResponse {
            requests_forwarded: state.stats.forwarded.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
            broadcasts: state.stats.broadcasts.load(Ordering::Relaxed),
            config_reloads: state.stats.config_reloads.load(Ordering::Relaxed),
        },
    })
}
