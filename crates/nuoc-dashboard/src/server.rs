//! Data API server using HTTP (axum).

use crate::config::ServerConfig;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use nuoc_core::{ChartSeries, DataError, DataSource, HistoricalLocation, MapMarker, Province};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

struct ServerState {
    source: DataSource,
}

type AppState = Arc<ServerState>;

/// Build the API router over the files in `config.data_dir`.
pub fn router(config: &ServerConfig) -> Router {
    let state = Arc::new(ServerState {
        source: DataSource::new(&config.data_dir),
    });

    let app = Router::new()
        .route("/", get(get_root))
        // Raw files, as stored
        .route("/api/data/{province}", get(get_locations))
        .route("/api/data/historical/{province}", get(get_historical))
        // Derived views
        .route("/api/markers", get(get_markers))
        .route("/api/search", get(search))
        .route("/api/history/{location}", get(get_chart))
        .with_state(state);

    if config.cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let app = router(&config);

    tracing::info!("Serving data from {}", config.data_dir.display());
    tracing::info!("Listening on http://{}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// An error body: `{"error": "..."}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Map a load failure, hiding file details behind `summary`.
    fn load(summary: &str, err: DataError) -> Self {
        if err.is_not_found() {
            return Self::not_found(err.to_string());
        }
        tracing::error!("{}: {}", summary, err);
        Self::internal(summary)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Run a file read off the async workers.
async fn with_source<T, F>(state: &AppState, summary: &str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DataSource) -> Result<T, DataError> + Send + 'static,
{
    let source = state.source.clone();
    match tokio::task::spawn_blocking(move || f(&source)).await {
        Ok(result) => result.map_err(|e| ApiError::load(summary, e)),
        Err(e) => {
            tracing::error!("{}: {}", summary, e);
            Err(ApiError::internal(summary))
        }
    }
}

fn province(slug: &str) -> Result<Province, ApiError> {
    slug.parse()
        .map_err(|e: nuoc_core::UnknownProvince| ApiError::not_found(e.to_string()))
}

/// GET / - service banner
async fn get_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Water Quality Analysis API" }))
}

/// GET /api/data/{province} - latest snapshot file
async fn get_locations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let province = province(&slug)?;
    let raw = with_source(&state, "Failed to load data", move |source| {
        source.read_raw(province.locations_file())
    })
    .await?;
    Ok(Json(raw))
}

/// GET /api/data/historical/{province} - compiled history file
async fn get_historical(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let province = province(&slug)?;
    let raw = with_source(&state, "Failed to load historical data", move |source| {
        let file = province
            .history_file()
            .ok_or(DataError::NoHistory(province))?;
        source.read_raw(file)
    })
    .await?;
    Ok(Json(raw))
}

/// GET /api/markers - every placeable location
async fn get_markers(State(state): State<AppState>) -> Result<Json<Vec<MapMarker>>, ApiError> {
    let markers = with_source(&state, "Failed to load data", |source| source.markers()).await?;
    Ok(Json(markers))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    suggestions: Vec<String>,
    selected: Option<MapMarker>,
}

/// GET /api/search?q= - suggestions plus the marker a submit would select
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let markers = with_source(&state, "Failed to load data", |source| source.markers()).await?;
    let suggestions = nuoc_core::suggestions(&markers, &params.q)
        .into_iter()
        .map(str::to_owned)
        .collect();
    let selected = nuoc_core::resolve(&markers, &params.q).cloned();

    tracing::debug!(query = %params.q, found = selected.is_some(), "search");
    Ok(Json(SearchResponse {
        suggestions,
        selected,
    }))
}

#[derive(Debug, Deserialize)]
struct ChartParams {
    #[serde(default)]
    measurement: usize,
}

/// GET /api/history/{location}?measurement=N - one series in date order
async fn get_chart(
    State(state): State<AppState>,
    Path(location): Path<String>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartSeries>, ApiError> {
    let wanted = location.clone();
    let history = with_source(&state, "Failed to load historical data", move |source| {
        let entries = source.history(Province::SocTrang)?;
        HistoricalLocation::find(&entries, &wanted)
            .cloned()
            .ok_or(DataError::LocationNotFound(wanted))
    })
    .await?;

    chart(&history, params.measurement).map(Json)
}

fn chart(history: &HistoricalLocation, index: usize) -> Result<ChartSeries, ApiError> {
    history.chart(index).ok_or_else(|| {
        ApiError::not_found(format!(
            "no measurement {} for location: {}",
            index, history.location
        ))
    })
}
