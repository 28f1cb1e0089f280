// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::qualifying_service::QualifyingService;
use crate::application::replay_service::ReplayService;
use crate::application::schedule_service::ScheduleService;
use crate::infrastructure::cache::DiskCache;
use crate::infrastructure::config::load_server_config;
use crate::infrastructure::http_provider::HttpSessionProvider;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, list_events, list_sprint_events, qualifying_driver_telemetry,
    qualifying_results, race_telemetry, root, track_geometry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "race_replay_telemetry=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config = load_server_config()?;
    let provider_timeout = Duration::from_secs(config.provider.timeout_secs);

    // Create provider adapter and cache (infrastructure layer). The
    // cache directory is created here, at construction, not lazily on
    // first request.
    let provider = Arc::new(HttpSessionProvider::new(
        config.provider.base_url.clone(),
        provider_timeout,
    )?);
    let cache = Arc::new(
        DiskCache::new(config.cache_dir.clone())
            .with_context(|| format!("failed to open cache at {}", config.cache_dir.display()))?,
    );

    // Create services (application layer)
    let replay_service = ReplayService::new(provider.clone(), cache.clone(), provider_timeout);
    let qualifying_service =
        QualifyingService::new(provider.clone(), cache.clone(), provider_timeout);
    let schedule_service = ScheduleService::new(provider.clone(), provider_timeout);

    // Create application state
    let state = Arc::new(AppState {
        replay_service,
        qualifying_service,
        schedule_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/", get(root))
        .route("/healthz", get(health_check))
        .route("/race/:year/:round/:session_type/telemetry", get(race_telemetry))
        .route("/race/:year/:round/:session_type/track", get(track_geometry))
        .route(
            "/qualifying/:year/:round/:session_type/results",
            get(qualifying_results),
        )
        .route(
            "/qualifying/:year/:round/:session_type/telemetry/:driver_code/:segment",
            get(qualifying_driver_telemetry),
        )
        .route("/events/:year", get(list_events))
        .route("/events/:year/sprints", get(list_sprint_events))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    tracing::info!("starting race-replay-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
