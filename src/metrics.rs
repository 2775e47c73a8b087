use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a router exposing `/metrics`
/// in the exposition format. Must run before any counter is touched, or
/// those series silently go to the no-op recorder.
pub fn install(poll_interval_secs: u64) -> Router {
    // Default buckets; custom ones are not worth the version churn.
    let handle: PrometheusHandle = PrometheusBuilder::new()
        .install_recorder()
        .expect("prometheus: install recorder");

    // Static gauge so dashboards can annotate the expected tick cadence.
    gauge!("poll_interval_secs").set(poll_interval_secs as f64);

    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
