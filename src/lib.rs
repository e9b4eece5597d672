pub mod config;
pub mod error;
pub mod gateways;
pub mod handlers;
pub mod location;
pub mod middleware;
pub mod routes;
pub mod utils;

pub use config::Config;
pub use error::{AppError, AppResult};

use gateways::fare::FareClient;
use location::LocationResolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: LocationResolver,
    pub fares: FareClient,
}

impl AppState {
    /// Build the HTTP client, geocoder and fare client described by `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let geocoder = gateways::geocoding_gateway(&config.geocoder, http.clone());
        let resolver = LocationResolver::new(geocoder, config.reference, config.retry);
        let fares = FareClient::new(http, config.fare_api_url.clone());

        Ok(Self {
            resolver,
            fares,
        })
    }
}
