//! HTTP API server for the board-game rental business.
//!
//! Exposes the category catalog, game inventory, customer registry, and
//! rental lifecycle as REST endpoints, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/categories", post(routes::categories::create::<S>))
        .route("/categories", get(routes::categories::list::<S>))
        .route("/games", post(routes::games::create::<S>))
        .route("/games", get(routes::games::list::<S>))
        .route("/customers", post(routes::customers::create::<S>))
        .route("/customers", get(routes::customers::list::<S>))
        .route("/customers/{id}", get(routes::customers::get::<S>))
        .route("/customers/{id}", put(routes::customers::update::<S>))
        .route("/rentals", post(routes::rentals::create::<S>))
        .route("/rentals", get(routes::rentals::list::<S>))
        .route("/rentals/{id}/return", post(routes::rentals::close::<S>))
        .route("/rentals/{id}", delete(routes::rentals::delete::<S>))
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
