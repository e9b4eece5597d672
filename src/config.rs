use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::location::{ReferencePoint, RetryPolicy};
use crate::utils::geo::is_valid_coordinate;

const DEFAULT_FARE_API_URL: &str = "https://taxifare-805490564375.europe-west1.run.app/predict";
const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";
const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {kind}, got '{value}'")]
    Invalid {
        key: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Which geocoding backend to talk to
#[derive(Clone)]
pub enum GeocoderConfig {
    OpenRouteService { base_url: String, api_key: String },
    Nominatim { base_url: String },
}

// Keeps the API key out of logs
impl fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocoderConfig::OpenRouteService { base_url, .. } => f
                .debug_struct("OpenRouteService")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .finish(),
            GeocoderConfig::Nominatim { base_url } => f
                .debug_struct("Nominatim")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub fare_api_url: String,
    pub geocoder: GeocoderConfig,
    pub user_agent: String,
    pub reference: ReferencePoint,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    /// Milliseconds to replenish one request token, per client IP
    pub rate_limit_period_ms: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let geocoder = match lookup("ORS_API_KEY").filter(|k| !k.trim().is_empty()) {
            Some(api_key) => GeocoderConfig::OpenRouteService {
                base_url: string_or("ORS_BASE_URL", DEFAULT_ORS_BASE_URL),
                api_key,
            },
            None => GeocoderConfig::Nominatim {
                base_url: string_or("NOMINATIM_BASE_URL", DEFAULT_NOMINATIM_BASE_URL),
            },
        };

        let defaults = RetryPolicy::default();
        let attempts = parse_or(&lookup, "GEOCODE_ATTEMPTS", "integer", defaults.attempts)?;
        if attempts == 0 {
            return Err(ConfigError::Zero {
                key: "GEOCODE_ATTEMPTS",
            });
        }
        let retry_delay = parse_or(
            &lookup,
            "GEOCODE_RETRY_DELAY_SECS",
            "number",
            defaults.delay.as_secs_f64(),
        )?;

        let reference = ReferencePoint {
            latitude: parse_or(&lookup, "REFERENCE_LAT", "number", ReferencePoint::NEW_YORK_CITY.latitude)?,
            longitude: parse_or(&lookup, "REFERENCE_LNG", "number", ReferencePoint::NEW_YORK_CITY.longitude)?,
            radius_miles: parse_or(&lookup, "SERVICE_RADIUS_MILES", "number", ReferencePoint::NEW_YORK_CITY.radius_miles)?,
        };
        if !is_valid_coordinate(reference.latitude, reference.longitude) {
            let (key, value) = if (-90.0..=90.0).contains(&reference.latitude) {
                ("REFERENCE_LNG", reference.longitude)
            } else {
                ("REFERENCE_LAT", reference.latitude)
            };
            return Err(ConfigError::Invalid {
                key,
                kind: "coordinate",
                value: value.to_string(),
            });
        }
        if !reference.radius_miles.is_finite() || reference.radius_miles < 0.0 {
            return Err(ConfigError::Invalid {
                key: "SERVICE_RADIUS_MILES",
                kind: "non-negative number of miles",
                value: reference.radius_miles.to_string(),
            });
        }

        let http_timeout = seconds(
            parse_or(&lookup, "HTTP_TIMEOUT_SECS", "number", 10.0)?,
            "HTTP_TIMEOUT_SECS",
        )?;
        if http_timeout.is_zero() {
            return Err(ConfigError::Zero {
                key: "HTTP_TIMEOUT_SECS",
            });
        }

        let rate_limit_period_ms: u64 = parse_or(&lookup, "RATE_LIMIT_PERIOD_MS", "integer", 600)?;
        if rate_limit_period_ms == 0 {
            return Err(ConfigError::Zero {
                key: "RATE_LIMIT_PERIOD_MS",
            });
        }
        let rate_limit_burst: u32 = parse_or(&lookup, "RATE_LIMIT_BURST", "integer", 30)?;
        if rate_limit_burst == 0 {
            return Err(ConfigError::Zero {
                key: "RATE_LIMIT_BURST",
            });
        }

        Ok(Self {
            server_host: string_or("SERVER_HOST", "0.0.0.0"),
            server_port: parse_or(&lookup, "SERVER_PORT", "port", 3000)?,
            fare_api_url: string_or("FARE_API_URL", DEFAULT_FARE_API_URL),
            geocoder,
            user_agent: string_or(
                "GEOCODER_USER_AGENT",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            ),
            reference,
            retry: RetryPolicy::new(attempts, seconds(retry_delay, "GEOCODE_RETRY_DELAY_SECS")?),
            http_timeout,
            rate_limit_period_ms,
            rate_limit_burst,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, kind: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, kind, value }),
    }
}

fn seconds(value: f64, key: &'static str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Invalid {
        key,
        kind: "non-negative number of seconds",
        value: value.to_string(),
    })
}
