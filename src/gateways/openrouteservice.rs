use serde::Deserialize;

use super::{GeoPoint, GeocodeError, GeocodeFuture, Geocoder};

/// Geocoder backed by the OpenRouteService (Pelias) search API
#[derive(Clone)]
pub struct OpenRouteService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteService {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn search(&self, text: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = format!("{}/geocode/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("text", text),
                ("size", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}

impl Geocoder for OpenRouteService {
    fn geocode<'a>(&'a self, address: &'a str) -> GeocodeFuture<'a> {
        Box::pin(self.search(address))
    }
}

// GeoJSON FeatureCollection, only the parts we read
#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

fn parse_search_response(body: &str) -> Result<Option<GeoPoint>, GeocodeError> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;

    let Some(feature) = collection.features.into_iter().next() else {
        return Ok(None);
    };

    // GeoJSON positions are [lng, lat]
    match feature.geometry.coordinates.as_slice() {
        [longitude, latitude, ..] => Ok(Some(GeoPoint {
            latitude: *latitude,
            longitude: *longitude,
        })),
        _ => Err(GeocodeError::Decode(
            "feature geometry has fewer than two coordinates".to_string(),
        )),
    }
}
