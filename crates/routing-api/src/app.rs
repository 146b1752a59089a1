use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::{Coordinate, RoutingError};
use routing_engine::{RouteResult, RoutingEngine};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

pub struct AppState {
    pub engine: RoutingEngine,
    pub app_name: String,
    pub app_version: String,
    pub environment: String,
    pub request_timeout: Duration,
    pub static_dir: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/", get(health_check))
        .route("/route", post(compute_route))
        .route("/route/", post(compute_route))
        .route("/map", get(map_page))
        .nest_service("/static", static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// --- DTOs ---

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Accepted for forward compatibility; routing is not time-dependent
    #[serde(default)]
    pub departure_time: Option<String>,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    app: String,
    version: String,
    environment: String,
    graph_loaded: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    Routing(RoutingError),
    Timeout(Duration),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self {
            ApiError::InvalidRequest(detail) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", detail)
            }
            ApiError::Timeout(limit) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!("routing did not finish within {} s", limit.as_secs()),
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "not_found", detail),
            ApiError::Routing(err) => {
                let detail = err.to_string();
                match err {
                    RoutingError::NoPathFound { .. } => (StatusCode::NOT_FOUND, "no_route", detail),
                    e if e.is_map_data_failure() => {
                        (StatusCode::BAD_GATEWAY, "map_data_unavailable", detail)
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal", detail),
                }
            }
        };
        (status, Json(ErrorBody { error, detail })).into_response()
    }
}

// --- HANDLERS ---

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        app: state.app_name.clone(),
        version: state.app_version.clone(),
        environment: state.environment.clone(),
        graph_loaded: state.engine.graph_loaded().await,
    })
}

async fn compute_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    for (name, coord) in [("origin", &request.origin), ("destination", &request.destination)] {
        if !coord.is_valid() {
            return Err(ApiError::InvalidRequest(format!(
                "{} must have lat in [-90, 90] and lon in [-180, 180]",
                name
            )));
        }
    }

    if let Some(departure_time) = &request.departure_time {
        debug!("Ignoring departure_time={} (routing is not time-dependent)", departure_time);
    }

    let routing = state
        .engine
        .compute_route(request.origin, request.destination);
    match tokio::time::timeout(state.request_timeout, routing).await {
        Ok(Ok(route)) => Ok(Json(route)),
        Ok(Err(err)) => {
            if err.is_recoverable() {
                info!("No route found: {}", err);
            } else {
                error!("Routing failed: {}", err);
            }
            Err(ApiError::Routing(err))
        }
        Err(_) => {
            warn!("Routing request timed out after {:?}", state.request_timeout);
            Err(ApiError::Timeout(state.request_timeout))
        }
    }
}

async fn map_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let index = state.static_dir.join("index.html");
    info!("Serving /map from {}", index.display());

    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            error!("index.html not readable at {}: {}", index.display(), e);
            Err(ApiError::NotFound("index.html not found".to_string()))
        }
    }
}
