use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ConfigError};
use crate::handlers::{fare, health, location};
use crate::middleware::rate_limit::{create_global_governor, log_request};
use crate::AppState;

/// API routes without transport middleware, so tests can drive them directly
pub fn create_router(state: AppState) -> Router {
    let location_routes = Router::new()
        .route("/reference", get(location::reference_point))
        .route("/locations/resolve", post(location::resolve_location));

    let fare_routes = Router::new().route("/predict", post(fare::predict_fare));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api", location_routes)
        .nest("/api/fares", fare_routes)
        .with_state(state)
}

/// The full application: routes wrapped in tracing, CORS and the per-IP
/// rate limiter.
///
/// `log_request` sits outermost so it also sees the governor's 429s. The
/// result must be served with `into_make_service_with_connect_info`.
pub fn create_app(state: AppState, config: &Config) -> Result<Router, ConfigError> {
    let governor = create_global_governor(config)?;

    Ok(create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(governor)
        .layer(middleware::from_fn(log_request)))
}
