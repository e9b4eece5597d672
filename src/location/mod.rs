//! Location inputs, resolved points and the resolver that turns one into
//! the other.

mod resolver;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::geo::haversine_distance_miles;

pub use resolver::LocationResolver;

/// Which stop of the trip a location belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pickup,
    Dropoff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Pickup => f.write_str("pickup"),
            Role::Dropoff => f.write_str("dropoff"),
        }
    }
}

/// A location as entered by the user: free text to geocode, or a
/// coordinate pair where either half may be missing.
///
/// On the wire this is `{"address": "..."}` or
/// `{"latitude": .., "longitude": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Address {
        address: String,
    },
    Coordinates {
        #[serde(default)]
        latitude: Option<f64>,
        #[serde(default)]
        longitude: Option<f64>,
    },
}

impl LocationInput {
    pub fn address(text: impl Into<String>) -> Self {
        LocationInput::Address {
            address: text.into(),
        }
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        LocationInput::Coordinates {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub distance_from_reference_miles: f64,
    /// `distance_from_reference_miles <= radius_miles`
    pub valid: bool,
}

/// Centre of the service area and how far from it a stop may be
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_miles: f64,
}

impl ReferencePoint {
    pub const NEW_YORK_CITY: ReferencePoint = ReferencePoint {
        latitude: 40.7128,
        longitude: -74.0060,
        radius_miles: 50.0,
    };

    /// Measure a known point against this reference
    pub fn locate(&self, latitude: f64, longitude: f64) -> ResolvedLocation {
        let distance =
            haversine_distance_miles(self.latitude, self.longitude, latitude, longitude);

        ResolvedLocation {
            latitude,
            longitude,
            distance_from_reference_miles: distance,
            valid: distance <= self.radius_miles,
        }
    }
}

/// How often to ask the geocoder before giving up on an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Pause between two attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Same attempt count without sleeping in between
    pub const fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("The {role} location is missing")]
    MissingInput { role: Role },

    #[error("The {role} coordinates are out of range")]
    InvalidCoordinates { role: Role },

    #[error("Could not find the {role} address '{address}' after {attempts} attempts")]
    GeocodeFailed {
        role: Role,
        address: String,
        attempts: u32,
    },

    #[error("Geocoding service unavailable for the {role} location: {message}")]
    ServiceUnavailable { role: Role, message: String },
}

impl ResolutionError {
    pub fn role(&self) -> Role {
        match self {
            ResolutionError::MissingInput { role }
            | ResolutionError::InvalidCoordinates { role }
            | ResolutionError::GeocodeFailed { role, .. }
            | ResolutionError::ServiceUnavailable { role, .. } => *role,
        }
    }
}
