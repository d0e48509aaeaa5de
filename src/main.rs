use axum::{extract::Query, extract::State, http::StatusCode, routing::get, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use corner_metrics_backend::{
    AnalysisConfig, AnalysisError, AnalysisService, CornerCatalog, DriverCornerMetrics,
    DriverNumber, HttpDataSource, PositionTableEntry, SessionKey,
};

// ---------- Request types ----------

#[derive(Deserialize, Debug)]
struct CornersQuery {
    session_key: u32,
    driver: u32,
}

#[derive(Deserialize, Debug)]
struct MetricsQuery {
    session_key: u32,
    driver: u32,
    corner: usize,
    /// Comma-separated driver numbers, e.g. "1,16,44"
    drivers: String,
}

#[derive(Deserialize, Debug)]
struct PositionsQuery {
    session_key: u32,
}

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    svc: Arc<AnalysisService<HttpDataSource>>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn to_api_error(err: AnalysisError) -> ApiError {
    let status = match &err {
        AnalysisError::Fetch(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Stale => StatusCode::CONFLICT,
        AnalysisError::NoReferenceLap(_) | AnalysisError::CornerOutOfRange(_) => {
            StatusCode::NOT_FOUND
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

fn parse_driver_list(raw: &str) -> Result<Vec<DriverNumber>, ApiError> {
    let drivers: Result<Vec<DriverNumber>, _> = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<u32>().map(DriverNumber))
        .collect();
    drivers.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid driver list: {raw}") })),
        )
    })
}

// ---------- Handlers ----------

async fn corners(
    State(state): State<AppState>,
    Query(q): Query<CornersQuery>,
) -> Result<Json<CornerCatalog>, ApiError> {
    let catalog = state
        .svc
        .corner_catalog(SessionKey(q.session_key), DriverNumber(q.driver))
        .await
        .map_err(to_api_error)?;
    Ok(Json(catalog))
}

async fn corner_metrics(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> Result<Json<Vec<DriverCornerMetrics>>, ApiError> {
    let drivers = parse_driver_list(&q.drivers)?;
    let comparison = state
        .svc
        .corner_comparison(
            SessionKey(q.session_key),
            DriverNumber(q.driver),
            q.corner,
            &drivers,
        )
        .await
        .map_err(to_api_error)?;
    Ok(Json(comparison))
}

async fn positions(
    State(state): State<AppState>,
    Query(q): Query<PositionsQuery>,
) -> Result<Json<Vec<PositionTableEntry>>, ApiError> {
    let table = state
        .svc
        .position_table(SessionKey(q.session_key))
        .await
        .map_err(to_api_error)?;
    Ok(Json(table))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::var("ANALYSIS_CONFIG") {
        Ok(path) => AnalysisConfig::load(&path)?,
        Err(_) => AnalysisConfig::default(),
    };
    let port: u16 = std::env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080);

    let source =
        HttpDataSource::new(&config.base_url, Duration::from_secs(config.request_timeout_s))?;
    let state = AppState { svc: Arc::new(AnalysisService::new(source, config)) };

    let app = axum::Router::new()
        .route("/corners", get(corners))
        .route("/corner_metrics", get(corner_metrics))
        .route("/positions", get(positions))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
