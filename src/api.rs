use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::dashboard::{parse_metrics, Dashboard, PageOutcome, PageRequest};
use crate::ratios::Metric;

const INDEX_HTML: &str = include_str!("../ui/index.html");

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/metric-options", get(metric_options))
        .route("/api/metrics", get(metrics_page))
        .route("/api/sentiment", get(sentiment_page))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - invalid input
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
        };
        let body = ErrorBody {
            error: error_type.into(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn metric_options() -> Json<Vec<&'static str>> {
    Json(Metric::ALL.iter().map(|m| m.label()).collect())
}

#[derive(Debug, Default, Deserialize)]
struct MetricsQuery {
    #[serde(default)]
    tickers: Option<String>,
    /// Comma-separated metric display names.
    #[serde(default)]
    metrics: Option<String>,
}

async fn metrics_page(
    State(state): State<AppState>,
    Query(q): Query<MetricsQuery>,
) -> Result<Json<PageOutcome>, ApiError> {
    let names: Vec<&str> = q
        .metrics
        .as_deref()
        .map(|s| s.split(',').collect())
        .unwrap_or_default();
    let metrics = parse_metrics(&names).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let req = PageRequest::FinancialMetrics {
        tickers_input: q.tickers.unwrap_or_default(),
        metrics,
    };
    Ok(Json(state.dashboard.dispatch(&req).await))
}

#[derive(Debug, Default, Deserialize)]
struct SentimentQuery {
    #[serde(default)]
    query: Option<String>,
}

async fn sentiment_page(
    State(state): State<AppState>,
    Query(q): Query<SentimentQuery>,
) -> Json<PageOutcome> {
    let req = PageRequest::Sentiment {
        query: q.query.unwrap_or_default(),
    };
    Json(state.dashboard.dispatch(&req).await)
}
