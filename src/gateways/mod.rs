//! Outbound HTTP integrations: geocoding providers and the fare service.

pub mod fare;
pub mod nominatim;
pub mod openrouteservice;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::GeocoderConfig;

/// A geocoded point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoder returned status {0}")]
    Status(StatusCode),

    #[error("failed to parse geocoder response: {0}")]
    Decode(String),
}

pub type GeocodeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<GeoPoint>, GeocodeError>> + Send + 'a>>;

/// A provider that turns free-text addresses into coordinates
pub trait Geocoder: Send + Sync + 'static {
    /// Best match for `address`, or `None` if the provider found nothing
    fn geocode<'a>(&'a self, address: &'a str) -> GeocodeFuture<'a>;
}

/// Pick the geocoding backend described by the configuration
pub fn geocoding_gateway(cfg: &GeocoderConfig, client: reqwest::Client) -> Arc<dyn Geocoder> {
    match cfg {
        GeocoderConfig::OpenRouteService { base_url, api_key } => {
            tracing::info!("Use OpenRouteService geocoder at {}", base_url);
            Arc::new(openrouteservice::OpenRouteService::new(
                client,
                base_url.clone(),
                api_key.clone(),
            ))
        }
        GeocoderConfig::Nominatim { base_url } => {
            tracing::warn!(
                "No OpenRouteService key configured: use Nominatim at {} as fallback",
                base_url
            );
            Arc::new(nominatim::Nominatim::new(client, base_url.clone()))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
