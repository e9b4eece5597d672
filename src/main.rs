use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxi_fare_backend::{config::Config, routes, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxi_fare_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Invalid configuration");
    tracing::info!("Starting server at {}", config.server_addr());
    tracing::info!(
        latitude = config.reference.latitude,
        longitude = config.reference.longitude,
        radius_miles = config.reference.radius_miles,
        attempts = config.retry.attempts,
        "Service area configured"
    );

    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");

    // Create app state
    let state = AppState::from_config(&config).expect("Failed to initialise HTTP clients");

    // Create router with middleware
    let app = routes::create_app(state, &config).expect("Invalid rate limit configuration");

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
