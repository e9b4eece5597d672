use serde::Serialize;

use crate::location::ResolvedLocation;

/// Initial zoom hint for clients that don't fit to `bounds`
const DEFAULT_ZOOM: u8 = 6;

/// Data a map client needs to draw the trip: a centre, a box to fit and
/// one marker per stop. Positions are `[lat, lng]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub bounds: [[f64; 2]; 2],
    pub markers: Vec<MapMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub label: &'static str,
    pub color: &'static str,
    pub position: [f64; 2],
}

impl MapView {
    pub fn for_trip(pickup: &ResolvedLocation, dropoff: &ResolvedLocation) -> Self {
        let center = [
            (pickup.latitude + dropoff.latitude) / 2.0,
            (pickup.longitude + dropoff.longitude) / 2.0,
        ];
        let bounds = [
            [
                pickup.latitude.min(dropoff.latitude),
                pickup.longitude.min(dropoff.longitude),
            ],
            [
                pickup.latitude.max(dropoff.latitude),
                pickup.longitude.max(dropoff.longitude),
            ],
        ];

        Self {
            center,
            zoom: DEFAULT_ZOOM,
            bounds,
            markers: vec![
                MapMarker {
                    label: "Pickup",
                    color: "blue",
                    position: [pickup.latitude, pickup.longitude],
                },
                MapMarker {
                    label: "Dropoff",
                    color: "red",
                    position: [dropoff.latitude, dropoff.longitude],
                },
            ],
        }
    }
}
