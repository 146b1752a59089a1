//! Routing API - HTTP front end for the routing engine.
//!
//! Serves `POST /route` for shortest drivable routes, `GET /health` for
//! liveness, and the static map frontend under `/map` and `/static`.

mod app;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use common::{telemetry, Config, MapSourceKind};
use routing_engine::{
    EngineSettings, FixtureSource, MapDataSource, OverpassSource, PbfSource, RoutingEngine,
};
use tokio::signal;
use tracing::info;

use crate::app::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing("routing-api", &config.log_level, config.log_json);

    let source = build_source(&config)?;
    let engine = RoutingEngine::new(
        source,
        EngineSettings {
            speed_kmh: config.speed_kmh,
            max_radius_m: config.max_radius_m,
        },
    )
    .context("Failed to create routing engine")?;

    let state = Arc::new(AppState {
        engine,
        app_name: config.app_name.clone(),
        app_version: config.app_version.clone(),
        environment: config.environment.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        static_dir: PathBuf::from(&config.static_dir),
    });

    let app = app::router(state);

    info!("🚀 API listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete.");
    Ok(())
}

fn build_source(config: &Config) -> Result<Arc<dyn MapDataSource>> {
    let source: Arc<dyn MapDataSource> = match config.map_source {
        MapSourceKind::Overpass => Arc::new(
            OverpassSource::new(
                config.overpass_url.clone(),
                Duration::from_secs(config.overpass_timeout_secs),
            )
            .context("Failed to create Overpass client")?,
        ),
        MapSourceKind::Pbf => Arc::new(PbfSource::new(&config.pbf_path)),
        MapSourceKind::Fixture => Arc::new(FixtureSource::milan()),
    };
    info!("🗺️ Map data source: {}", source.name());
    Ok(source)
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Received shutdown signal");
}
