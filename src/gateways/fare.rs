use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Query parameters understood by the fare prediction endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareQuery {
    /// `YYYY-MM-DD HH:MM:SS`
    pub pickup_datetime: String,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
    pub passenger_count: u8,
}

#[derive(Debug, Error)]
pub enum FareError {
    #[error("fare request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fare service returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("fare service reported an error: {0}")]
    Upstream(String),

    #[error("failed to parse fare response: {0}")]
    Decode(String),
}

/// Longest upstream body we copy into an error message
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct FareClient {
    client: reqwest::Client,
    url: String,
}

impl FareClient {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    /// Ask the remote model for a fare in dollars
    pub async fn predict(&self, query: &FareQuery) -> Result<f64, FareError> {
        tracing::debug!(?query, "Requesting fare prediction");

        let response = self.client.get(&self.url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FareError::Status {
                status,
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        parse_fare(&body)
    }
}

fn parse_fare(body: &str) -> Result<f64, FareError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| FareError::Decode(e.to_string()))?;

    if let Some(fare) = payload.get("fare") {
        return match fare.as_f64() {
            Some(fare) if fare.is_finite() => Ok(fare),
            _ => Err(FareError::Decode(format!("fare is not a number: {}", fare))),
        };
    }

    // FastAPI style {"detail": ..} or a plain {"error": ..}
    let reason = payload.get("error").or_else(|| payload.get("detail"));
    match reason {
        Some(Value::String(msg)) => Err(FareError::Upstream(msg.clone())),
        Some(other) => Err(FareError::Upstream(other.to_string())),
        None => Err(FareError::Decode(format!(
            "no fare in response: {}",
            truncate(body, MAX_ERROR_BODY)
        ))),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::gateways::test_server;

    fn query() -> FareQuery {
        FareQuery {
            pickup_datetime: "2014-07-06 19:18:00".to_string(),
            pickup_longitude: -73.950655,
            pickup_latitude: 40.783282,
            dropoff_longitude: -73.984365,
            dropoff_latitude: 40.769802,
            passenger_count: 2,
        }
    }

    #[test]
    fn test_parse_fare() {
        assert_eq!(parse_fare(r#"{"fare": 14.710600943237969}"#).unwrap(), 14.710600943237969);
        assert_eq!(parse_fare(r#"{"fare": 9}"#).unwrap(), 9.0);
    }

    #[test]
    fn test_parse_error_payloads() {
        match parse_fare(r#"{"error": "model not loaded"}"#) {
            Err(FareError::Upstream(msg)) => assert_eq!(msg, "model not loaded"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_fare(r#"{"detail": [{"loc": ["query", "pickup_datetime"], "msg": "field required"}]}"#),
            Err(FareError::Upstream(_))
        ));
        assert!(matches!(parse_fare(r#"{"fare": "cheap"}"#), Err(FareError::Decode(_))));
        assert!(matches!(parse_fare(r#"{"price": 3.0}"#), Err(FareError::Decode(_))));
        assert!(matches!(parse_fare("Service Unavailable"), Err(FareError::Decode(_))));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[tokio::test]
    async fn test_predict_sends_all_parameters() {
        let router = Router::new().route(
            "/predict",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let expected = [
                    ("pickup_datetime", "2014-07-06 19:18:00"),
                    ("pickup_longitude", "-73.950655"),
                    ("pickup_latitude", "40.783282"),
                    ("dropoff_longitude", "-73.984365"),
                    ("dropoff_latitude", "40.769802"),
                    ("passenger_count", "2"),
                ];
                let complete = expected
                    .iter()
                    .all(|(k, v)| q.get(*k).map(String::as_str) == Some(*v));
                if complete {
                    Json(json!({"fare": 7.5}))
                } else {
                    Json(json!({"error": format!("unexpected query {:?}", q)}))
                }
            }),
        );
        let base_url = test_server::spawn(router).await;
        let client = FareClient::new(reqwest::Client::new(), format!("{}/predict", base_url));

        assert_eq!(client.predict(&query()).await.unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_predict_non_success_status() {
        let router = Router::new().route(
            "/predict",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base_url = test_server::spawn(router).await;
        let client = FareClient::new(reqwest::Client::new(), format!("{}/predict", base_url));

        match client.predict(&query()).await {
            Err(FareError::Status { status, body }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
