//! Ticker Dashboard: binary entrypoint
//! Boots the Axum HTTP server serving the dashboard page and its two
//! pipelines (financial metrics, headline sentiment).

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install our own subscriber only when asked (DASHBOARD_LOG=1); the hosting
/// runtime may already have one, so failures to install are ignored.
/// DASHBOARD_LOG_FORMAT=json switches to JSON lines.
fn enable_tracing() {
    let on = std::env::var("DASHBOARD_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !on {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ticker_dashboard=info,warn"));

    let json = std::env::var("DASHBOARD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing subscriber not installed: {e}");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_tracing();

    let router = ticker_dashboard::app().await?;
    Ok(router.into())
}
