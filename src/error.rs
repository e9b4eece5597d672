use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateways::fare::FareError;
use crate::location::{ResolutionError, Role};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(
        "The {role} location is {distance_miles:.1} miles from the service area center (limit {radius_miles} miles)"
    )]
    OutsideServiceArea {
        role: Role,
        distance_miles: f64,
        radius_miles: f64,
    },

    #[error("Fare prediction failed: {0}")]
    FareService(#[from] FareError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Resolution(err) => match err {
                ResolutionError::MissingInput { .. } | ResolutionError::InvalidCoordinates { .. } => {
                    StatusCode::BAD_REQUEST
                }
                ResolutionError::GeocodeFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ResolutionError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::OutsideServiceArea { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FareService(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn role(&self) -> Option<Role> {
        match self {
            AppError::Resolution(err) => Some(err.role()),
            AppError::OutsideServiceArea { role, .. } => Some(*role),
            _ => None,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = match self.role() {
            Some(role) => json!({ "error": self.to_string(), "role": role }),
            None => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
