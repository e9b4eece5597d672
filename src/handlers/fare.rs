use axum::{extract::State, Json};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::gateways::fare::FareQuery;
use crate::handlers::JsonBody;
use crate::location::{LocationInput, ReferencePoint, ResolvedLocation, Role};
use crate::utils::map::MapView;
use crate::AppState;

pub const MIN_PASSENGERS: u8 = 1;
pub const MAX_PASSENGERS: u8 = 8;

const PICKUP_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
pub struct PredictFareRequest {
    pub pickup: LocationInput,
    pub dropoff: LocationInput,
    /// Defaults to today
    pub pickup_date: Option<NaiveDate>,
    /// Defaults to the current time
    pub pickup_time: Option<NaiveTime>,
    /// Defaults to a single passenger. Wide enough that any integer the
    /// client sends reaches the range check.
    pub passenger_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PredictFareResponse {
    pub fare: f64,
    pub pickup_datetime: String,
    pub passenger_count: u8,
    pub pickup: ResolvedLocation,
    pub dropoff: ResolvedLocation,
    pub map: MapView,
}

/// Resolve both stops, check they are inside the service area and ask the
/// fare model for a price
pub async fn predict_fare(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PredictFareRequest>,
) -> AppResult<Json<PredictFareResponse>> {
    let passenger_count = passenger_count(payload.passenger_count)?;
    let pickup_datetime = pickup_datetime(payload.pickup_date, payload.pickup_time);

    let reference = *state.resolver.reference();
    let pickup = state.resolver.resolve(Role::Pickup, payload.pickup).await?;
    ensure_in_service_area(Role::Pickup, &pickup, &reference)?;
    let dropoff = state.resolver.resolve(Role::Dropoff, payload.dropoff).await?;
    ensure_in_service_area(Role::Dropoff, &dropoff, &reference)?;

    let query = FareQuery {
        pickup_datetime: pickup_datetime.format(PICKUP_DATETIME_FORMAT).to_string(),
        pickup_longitude: pickup.longitude,
        pickup_latitude: pickup.latitude,
        dropoff_longitude: dropoff.longitude,
        dropoff_latitude: dropoff.latitude,
        passenger_count,
    };

    let fare = state.fares.predict(&query).await?;
    tracing::info!(
        fare,
        passenger_count,
        pickup_datetime = %query.pickup_datetime,
        "Fare predicted"
    );

    Ok(Json(PredictFareResponse {
        fare: round_cents(fare),
        pickup_datetime: query.pickup_datetime,
        passenger_count,
        map: MapView::for_trip(&pickup, &dropoff),
        pickup,
        dropoff,
    }))
}

fn passenger_count(requested: Option<i64>) -> AppResult<u8> {
    let Some(requested) = requested else {
        return Ok(MIN_PASSENGERS);
    };

    u8::try_from(requested)
        .ok()
        .filter(|count| (MIN_PASSENGERS..=MAX_PASSENGERS).contains(count))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Passenger count must be between {} and {}",
                MIN_PASSENGERS, MAX_PASSENGERS
            ))
        })
}

fn ensure_in_service_area(
    role: Role,
    location: &ResolvedLocation,
    reference: &ReferencePoint,
) -> AppResult<()> {
    if location.valid {
        return Ok(());
    }

    Err(AppError::OutsideServiceArea {
        role,
        distance_miles: location.distance_from_reference_miles,
        radius_miles: reference.radius_miles,
    })
}

/// Fill in whatever the user left out from the local clock
fn pickup_datetime(date: Option<NaiveDate>, time: Option<NaiveTime>) -> NaiveDateTime {
    let now = Local::now().naive_local();
    let time = time.unwrap_or_else(|| now.time().with_nanosecond(0).unwrap_or(now.time()));
    NaiveDateTime::new(date.unwrap_or(now.date()), time)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(14.710600943237969), 14.71);
        assert_eq!(round_cents(9.999), 10.0);
        assert_eq!(round_cents(5.0), 5.0);
    }

    #[test]
    fn test_passenger_count_range() {
        assert_eq!(passenger_count(None).unwrap(), 1);
        assert_eq!(passenger_count(Some(1)).unwrap(), 1);
        assert_eq!(passenger_count(Some(8)).unwrap(), 8);

        for out_of_range in [0, 9, 300, -1, i64::MAX] {
            match passenger_count(Some(out_of_range)) {
                Err(AppError::BadRequest(msg)) => {
                    assert_eq!(msg, "Passenger count must be between 1 and 8")
                }
                other => panic!("{out_of_range} gave {:?}", other),
            }
        }
    }

    #[test]
    fn test_pickup_datetime_uses_given_parts() {
        let date = NaiveDate::from_ymd_opt(2014, 7, 6).unwrap();
        let time = NaiveTime::from_hms_opt(19, 18, 0).unwrap();

        let dt = pickup_datetime(Some(date), Some(time));
        assert_eq!(dt.format(PICKUP_DATETIME_FORMAT).to_string(), "2014-07-06 19:18:00");
    }

    #[test]
    fn test_pickup_datetime_defaults_to_now() {
        let date = NaiveDate::from_ymd_opt(2014, 7, 6).unwrap();

        let dt = pickup_datetime(Some(date), None);
        assert_eq!(dt.date(), date);
        assert_eq!(dt.nanosecond(), 0);

        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let dt = pickup_datetime(None, Some(midnight));
        assert_eq!(dt.time(), midnight);
    }

    #[test]
    fn test_time_without_seconds_deserializes() {
        let req: PredictFareRequest = serde_json::from_str(
            r#"{
                "pickup": {"address": "Times Square"},
                "dropoff": {"latitude": 40.64, "longitude": -73.78},
                "pickup_date": "2024-03-01",
                "pickup_time": "08:30"
            }"#,
        )
        .unwrap();

        assert_eq!(req.pickup_time, NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(req.passenger_count, None);
    }

    #[test]
    fn test_outside_area_is_rejected_with_role() {
        let reference = ReferencePoint::NEW_YORK_CITY;
        let far = reference.locate(42.16, -74.0060);

        match ensure_in_service_area(Role::Dropoff, &far, &reference) {
            Err(AppError::OutsideServiceArea { role, radius_miles, .. }) => {
                assert_eq!(role, Role::Dropoff);
                assert_eq!(radius_miles, 50.0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let near = reference.locate(40.75, -73.99);
        assert!(ensure_in_service_area(Role::Pickup, &near, &reference).is_ok());
    }
}
