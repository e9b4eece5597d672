use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::JsonBody;
use crate::location::{LocationInput, ReferencePoint, ResolvedLocation, Role};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveLocationRequest {
    pub role: Role,
    pub location: LocationInput,
}

/// Resolve a single stop without asking for a fare.
///
/// Out-of-area points are not an error here; `valid` says whether the
/// fare endpoint would accept them.
pub async fn resolve_location(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ResolveLocationRequest>,
) -> AppResult<Json<ResolvedLocation>> {
    let resolved = state
        .resolver
        .resolve(payload.role, payload.location)
        .await?;

    Ok(Json(resolved))
}

/// The service area clients should keep stops inside
pub async fn reference_point(State(state): State<AppState>) -> Json<ReferencePoint> {
    Json(*state.resolver.reference())
}
