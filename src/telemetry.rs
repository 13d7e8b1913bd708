use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    /// If another recorder already owns the global slot, a detached recorder
    /// is built so `/metrics` still renders.
    pub fn init(cache_ttl_secs: u64) -> Self {
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            })
            .clone();

        describe_counter!("financials_lookups_total", "Statement lookups sent to providers.");
        describe_counter!(
            "financials_lookup_failures_total",
            "Tickers whose statement could not be retrieved."
        );
        describe_counter!(
            "financials_cache_hits_total",
            "Statement lookups served from the memo cache."
        );
        describe_counter!(
            "metric_records_emitted_total",
            "Ratio records written to metric tables."
        );
        crate::news::ensure_metrics_described();

        gauge!("financials_cache_ttl_secs").set(cache_ttl_secs as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
