// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod financials;
pub mod news;
pub mod ratios;
pub mod sentiment;
pub mod telemetry;

pub use crate::api::router;

use std::sync::Arc;
use std::time::Duration;

use crate::api::AppState;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::financials::cache::CachedFinancials;
use crate::financials::provider::{FinancialsProvider, YahooFinancialsProvider};
use crate::news::yahoo_rss::YahooRssFeed;
use crate::sentiment::SentimentClassifier;

/// Wire providers, the classifier and telemetry from a loaded config.
pub fn build_router(cfg: &DashboardConfig) -> anyhow::Result<axum::Router> {
    let yahoo = YahooFinancialsProvider::from_config(&cfg.financials)?;
    let financials: Arc<dyn FinancialsProvider> = if cfg.financials.cache_ttl_secs > 0 {
        Arc::new(CachedFinancials::new(
            yahoo,
            Duration::from_secs(cfg.financials.cache_ttl_secs),
        ))
    } else {
        Arc::new(yahoo)
    };
    let news = Arc::new(YahooRssFeed::from_config(&cfg.news)?);
    let classifier = Arc::new(SentimentClassifier::vader());

    let dashboard =
        Dashboard::new(financials, news, classifier).with_score_field(cfg.news.score_field);
    let mut app = api::router(AppState { dashboard });

    if cfg.telemetry.expose_metrics {
        let m = telemetry::Metrics::init(cfg.financials.cache_ttl_secs);
        app = app.merge(m.router());
    }

    tracing::info!(
        financials_base = %cfg.financials.base_url,
        cache_ttl_secs = cfg.financials.cache_ttl_secs,
        metrics = cfg.telemetry.expose_metrics,
        "dashboard router built"
    );
    Ok(app)
}

/// Full in-process app from `config/dashboard.toml` (or defaults) plus env.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = DashboardConfig::load_default()?;
    build_router(&cfg)
}
