use std::sync::Arc;

use crate::gateways::{GeoPoint, Geocoder};
use crate::utils::geo::is_valid_coordinate;

use super::{LocationInput, ReferencePoint, ResolutionError, ResolvedLocation, RetryPolicy, Role};

/// Turns user input into a point measured against the service area.
///
/// Holds no per-request state, so one instance is shared by every request
/// and pickup/dropoff can be resolved in either order.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    reference: ReferencePoint,
    retry: RetryPolicy,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, reference: ReferencePoint, retry: RetryPolicy) -> Self {
        Self {
            geocoder,
            reference,
            retry,
        }
    }

    pub fn reference(&self) -> &ReferencePoint {
        &self.reference
    }

    /// Resolve one stop of the trip.
    ///
    /// Points outside the radius are still returned, with `valid` unset,
    /// so the caller can report how far off they are.
    pub async fn resolve(
        &self,
        role: Role,
        input: LocationInput,
    ) -> Result<ResolvedLocation, ResolutionError> {
        let (latitude, longitude) = match input {
            LocationInput::Coordinates {
                latitude: Some(latitude),
                longitude: Some(longitude),
            } => (latitude, longitude),
            LocationInput::Coordinates { .. } => {
                return Err(ResolutionError::MissingInput { role });
            }
            LocationInput::Address { address } => {
                let address = address.trim();
                if address.is_empty() {
                    return Err(ResolutionError::MissingInput { role });
                }
                let point = self.geocode_with_retry(role, address).await?;
                (point.latitude, point.longitude)
            }
        };

        if !is_valid_coordinate(latitude, longitude) {
            return Err(ResolutionError::InvalidCoordinates { role });
        }

        let resolved = self.reference.locate(latitude, longitude);
        tracing::info!(
            %role,
            latitude,
            longitude,
            distance_miles = resolved.distance_from_reference_miles,
            valid = resolved.valid,
            "Location resolved"
        );

        Ok(resolved)
    }

    /// Ask the geocoder up to `retry.attempts` times.
    ///
    /// Errors and empty answers are both retried. Once attempts run out,
    /// the last outcome decides the failure: an error means the provider is
    /// unreachable, an empty answer means the address is unknown.
    async fn geocode_with_retry(
        &self,
        role: Role,
        address: &str,
    ) -> Result<GeoPoint, ResolutionError> {
        let attempts = self.retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!(%role, attempt, address, "Geocoding address");

            match self.geocoder.geocode(address).await {
                Ok(Some(point)) => return Ok(point),
                Ok(None) => {
                    tracing::warn!(%role, attempt, address, "No geocoding match");
                    last_error = None;
                }
                Err(e) => {
                    tracing::warn!(%role, attempt, address, error = %e, "Geocoding attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt < attempts && !self.retry.delay.is_zero() {
                tokio::time::sleep(self.retry.delay).await;
            }
        }

        match last_error {
            Some(e) => {
                tracing::error!(%role, address, attempts, error = %e, "Geocoding service unavailable");
                Err(ResolutionError::ServiceUnavailable {
                    role,
                    message: e.to_string(),
                })
            }
            None => Err(ResolutionError::GeocodeFailed {
                role,
                address: address.to_string(),
                attempts,
            }),
        }
    }
}
