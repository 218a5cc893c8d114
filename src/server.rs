//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding config, the
//! pooled HTTP client, resolver, security hooks, and stats),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the connection-pooled hyper
//! client, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::sync::RwLock;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::{GatewayConfig, PolicyKind};
use crate::config::ConfigVersion;
use crate::directory::ConfigDirectory;
use crate::proxy;
use crate::routing::policy::{DataSourceAffinity, RoundRobin, SelectionPolicy};
use crate::routing::HostResolver;
use crate::security::{
    AllowAllAuthorizer, AnonymousAuthenticator, Authenticator, Authorizer, BasicAuthenticator,
};
use crate::status::status_handler;
use crate::telemetry::{Emitter, TracingEmitter};

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Arc<GatewayConfig>,
    pub version: ConfigVersion,
    pub source_name: String,
    pub loaded_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
    pub broadcasts: AtomicU64,
    pub config_reloads: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            config_reloads: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// Pooled outbound client. The body type is `axum::body::Body` so the
/// inbound request body streams straight through to the backend leg
/// without re-buffering.
pub type HttpClient = Client<HttpsConnector, axum::body::Body>;

pub struct AppState {
    pub config: Arc<RwLock<LoadedConfig>>,
    pub http_client: HttpClient,
    pub resolver: HostResolver,
    pub authenticator: Box<dyn Authenticator>,
    pub authorizer: Box<dyn Authorizer>,
    pub emitter: Arc<dyn Emitter>,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    /// Wire up state from an initial loaded config. Policy and security
    /// hooks are fixed at startup; the server *set* stays live through
    /// the hot-reload loop.
    #[must_use]
    pub fn new(loaded: LoadedConfig) -> Arc<Self> {
        Self::with_emitter(loaded, Arc::new(TracingEmitter))
    }

    #[must_use]
    pub fn with_emitter(loaded: LoadedConfig, emitter: Arc<dyn Emitter>) -> Arc<Self> {
        let snapshot = Arc::clone(&loaded.config);
        let config = Arc::new(RwLock::new(loaded));

        let policy: Box<dyn SelectionPolicy> = match snapshot.defaults.policy {
            PolicyKind::RoundRobin => Box::new(RoundRobin::new()),
            PolicyKind::DataSourceAffinity => Box::new(DataSourceAffinity::new()),
        };
        let resolver = HostResolver::new(
            Arc::new(ConfigDirectory::new(Arc::clone(&config))),
            policy,
        );

        let authenticator: Box<dyn Authenticator> =
            match (&snapshot.auth.username, &snapshot.auth.password) {
                (Some(user), Some(pass)) => {
                    Box::new(BasicAuthenticator::new(user.clone(), pass.clone()))
                }
                _ => Box::new(AnonymousAuthenticator),
            };

        Arc::new(Self {
            config,
            http_client: build_http_client(),
            resolver,
            authenticator,
            authorizer: Box::new(AllowAllAuthorizer),
            emitter,
            start_time: Instant::now(),
            stats: Stats::new(),
        })
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in (e.g. `--all-features`
    // enables both `ring` and `aws-lc-rs`), rustls cannot auto-detect which one
    // to use. Explicitly install `ring` as the default provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Inbound middleware stack, outermost first: tracing, the shared
/// in-flight cap (new requests queue at capacity, they are not shed),
/// the request body cap, and response compression. The compression
/// layer is what honors `Accept-Encoding` — callers that do not
/// advertise gzip get identity responses.
pub fn build_router(state: Arc<AppState>, max_body: usize, max_in_flight: usize) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(GlobalConcurrencyLimitLayer::new(max_in_flight))
                // The explicit byte cap below is the limit; axum's
                // built-in 2 MB default would choke streamed uploads.
                .layer(axum::extract::DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
