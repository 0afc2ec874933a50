//! PhantomShield Gateway
//!
//! HTTP surface in front of the risk engine. The reverse proxy calls
//! `/api/v1/evaluate` for every authenticated request and forwards to the
//! upstream named in the verdict.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   PHANTOMSHIELD GATEWAY                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Admin    │  │  Session Sweeper        │ │
//! │  │  (Axum)   │  │  (Bearer) │  │  (Background Task)      │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐      ┌──────────────────┐   │
//! │                │   Engine    │─────▶│  Forensic Sink   │   │
//! │                └─────────────┘      └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod middleware;
mod error;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use chrono::Utc;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phantomshield_core::constants::{FORENSIC_DB_FILE, FORENSIC_LOG_DIR};
use phantomshield_core::{
    ConfigStore, ConfigWatcher, Engine, EngineConfig, ForensicSink, JsonlSink, MemorySink, SqliteSink,
};

pub use error::{AppError, AppResult};

/// Pending async forensic writes get this long to drain on shutdown
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize logging (also captures the engine's `log` records)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "phantomshield_gateway=debug,phantomshield_core=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();

    tracing::info!("PhantomShield Gateway starting ({})", config.environment);
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; admin routes are disabled");
    }

    // Engine config
    let store = match &config.engine_config_path {
        Some(path) => ConfigStore::from_file(path)
            .with_context(|| format!("Failed to load engine config {}", path.display()))?,
        None => {
            if config.is_production() {
                tracing::warn!("PHANTOMSHIELD_CONFIG not set; running on built-in defaults");
            }
            ConfigStore::new(EngineConfig::default())?
        }
    };
    let store = Arc::new(store);

    let _watcher = match store.source() {
        Some(path) if config.watch_config => {
            tracing::info!("Watching engine config {}", path.display());
            Some(ConfigWatcher::spawn(store.clone())?)
        }
        _ => None,
    };

    // Forensic sink + engine
    let sink = open_sink(&config)?;
    let engine = Arc::new(Engine::new(store, sink));

    spawn_sweeper(engine.clone(), Duration::from_secs(config.sweep_interval_secs));

    // Build application state
    let state = AppState {
        engine: engine.clone(),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if tokio::time::timeout(SHUTDOWN_DRAIN, engine.forensics().wait_idle()).await.is_err() {
        let stats = engine.forensics().stats();
        tracing::error!("FORENSIC ALERT: {} records still pending at shutdown", stats.pending);
    }

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: config::Config,
}

fn open_sink(config: &config::Config) -> anyhow::Result<Arc<dyn ForensicSink>> {
    let sink: Arc<dyn ForensicSink> = match config.sink_kind.as_str() {
        "sqlite" => {
            let path = config.data_dir.join(FORENSIC_DB_FILE);
            tracing::info!("Forensic sink: sqlite at {}", path.display());
            Arc::new(SqliteSink::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?)
        }
        "jsonl" => {
            let dir = config.data_dir.join(FORENSIC_LOG_DIR);
            tracing::info!("Forensic sink: jsonl under {}", dir.display());
            Arc::new(JsonlSink::new(dir)?)
        }
        "memory" => {
            tracing::warn!("Forensic sink: memory (records are lost on restart)");
            Arc::new(MemorySink::new())
        }
        other => anyhow::bail!("Unknown FORENSIC_SINK '{}' (expected sqlite, jsonl or memory)", other),
    };
    Ok(sink)
}

/// Periodically evict idle sessions and expired tombstones
fn spawn_sweeper(engine: Arc<Engine>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = engine.sweep(Utc::now());
            if evicted > 0 {
                tracing::info!(evicted, "Idle sessions evicted");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Routing path (called by the reverse proxy)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/evaluate", post(handlers::evaluate::evaluate));

    // Session control, audit and operations (admin bearer token)
    let admin_routes = Router::new()
        .route("/api/v1/sessions/:id", get(handlers::sessions::get))
        .route("/api/v1/sessions/:id/end", post(handlers::sessions::end))
        .route("/api/v1/forensics", get(handlers::forensics::query))
        .route("/api/v1/forensics/:session_id/timeline", get(handlers::forensics::timeline))
        .route("/api/v1/config/reload", post(handlers::admin::reload_config))
        .route("/api/v1/status", get(handlers::admin::status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
