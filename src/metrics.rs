use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the static process-level
    /// gauges (configured check cadence, start time).
    pub fn init(check_interval_secs: u64) -> Self {
        // Default buckets; custom ones are not worth the version churn.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_gauge!("check_interval_secs", "Configured scheduled-check cadence.");
        describe_gauge!("service_start_ts", "Unix ts when the process started.");
        gauge!("check_interval_secs").set(check_interval_secs as f64);
        gauge!("service_start_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

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
