//! HTTP API for the blood and organ bank.
//!
//! Exposes registration, donation recording, request intake, fulfillment and
//! read-only reports over JSON, with request tracing and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog::CatalogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Builds the router over a fully wired [`AppState`].
pub fn create_app<S: CatalogStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/donors",
            get(routes::donors::list::<S>).post(routes::donors::create::<S>),
        )
        .route("/recipients", post(routes::recipients::create::<S>))
        .route("/hospitals", post(routes::hospitals::create::<S>))
        .route("/donations", post(routes::donations::create::<S>))
        .route("/donations/stats", get(routes::donations::stats::<S>))
        .route("/requests", post(routes::requests::create::<S>))
        .route("/requests/pending", get(routes::requests::pending::<S>))
        .route("/requests/fulfill", post(routes::requests::fulfill::<S>))
        .route("/inventory", get(routes::inventory::list::<S>))
        .route(
            "/staff",
            get(routes::staff::list::<S>).post(routes::staff::create::<S>),
        )
        .route("/login", post(routes::staff::login::<S>));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Registers descriptions for every metric the services emit.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "donations_recorded_total",
        "Donations committed, labelled by type"
    );
    metrics::describe_counter!(
        "requests_submitted_total",
        "Requests filed, labelled by type"
    );
    metrics::describe_counter!("fulfillments_total", "Requests fulfilled");
    metrics::describe_counter!(
        "fulfillments_rejected_total",
        "Fulfillment attempts rejected, labelled by reason"
    );
    metrics::describe_histogram!(
        "fulfillment_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent in a fulfillment attempt"
    );
}
