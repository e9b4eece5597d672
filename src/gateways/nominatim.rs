use serde::Deserialize;

use super::{GeoPoint, GeocodeError, GeocodeFuture, Geocoder};

/// Geocoder backed by an OSM Nominatim instance. No key required, but the
/// public instance insists on an identifying User-Agent, which the shared
/// client carries.
#[derive(Clone)]
pub struct Nominatim {
    client: reqwest::Client,
    base_url: String,
}

impl Nominatim {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
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

impl Geocoder for Nominatim {
    fn geocode<'a>(&'a self, address: &'a str) -> GeocodeFuture<'a> {
        Box::pin(self.search(address))
    }
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn parse_search_response(body: &str) -> Result<Option<GeoPoint>, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Decode(format!("invalid lat '{}': {}", place.lat, e)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Decode(format!("invalid lon '{}': {}", place.lon, e)))?;

    Ok(Some(GeoPoint {
        latitude,
        longitude,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::gateways::test_server;

    #[test]
    fn test_parse_string_coordinates() {
        let body = r#"[{"place_id": 1, "lat": "40.7484284", "lon": "-73.9856546", "display_name": "Empire State Building"}]"#;

        let point = parse_search_response(body).unwrap().unwrap();
        assert_eq!(point.latitude, 40.7484284);
        assert_eq!(point.longitude, -73.9856546);
    }

    #[test]
    fn test_parse_empty_list_is_no_match() {
        assert!(parse_search_response("[]").unwrap().is_none());
    }

    #[test]
    fn test_parse_bad_number_is_decode_error() {
        let body = r#"[{"lat": "north", "lon": "-73.98"}]"#;
        assert!(matches!(
            parse_search_response(body),
            Err(GeocodeError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_search_against_local_server() {
        let router = Router::new().route(
            "/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("q").map(String::as_str) == Some("JFK Airport")
                    && q.get("format").map(String::as_str) == Some("json")
                {
                    Json(json!([{"lat": "40.6413", "lon": "-73.7781"}]))
                } else {
                    Json(json!([]))
                }
            }),
        );
        let base_url = test_server::spawn(router).await;
        let nominatim = Nominatim::new(reqwest::Client::new(), format!("{}/", base_url));

        let point = nominatim.geocode("JFK Airport").await.unwrap().unwrap();
        assert_eq!(point.latitude, 40.6413);
        assert_eq!(point.longitude, -73.7781);

        assert!(nominatim.geocode("Gotham").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_throttled_is_status_error() {
        let router = Router::new().route(
            "/search",
            get(|| async { StatusCode::TOO_MANY_REQUESTS }),
        );
        let base_url = test_server::spawn(router).await;
        let nominatim = Nominatim::new(reqwest::Client::new(), base_url);

        let err = nominatim.geocode("Times Square").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status(StatusCode::TOO_MANY_REQUESTS)));
    }
}
