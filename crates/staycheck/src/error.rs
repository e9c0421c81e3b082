use crate::config::ConfigError;
use crate::inspection::InspectionError;
use crate::store::StoreError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Top-level error for the HTTP service.
#[derive(Debug)]
pub enum ApiError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(StoreError),
    Inspection(InspectionError),
    Validation(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(err) => write!(f, "configuration error: {}", err),
            ApiError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            ApiError::Io(err) => write!(f, "io error: {}", err),
            ApiError::Server(err) => write!(f, "server error: {}", err),
            ApiError::Store(err) => write!(f, "{}", err),
            ApiError::Inspection(err) => write!(f, "{}", err),
            ApiError::Validation(detail) => write!(f, "invalid request: {}", detail),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Config(err) => Some(err),
            ApiError::Telemetry(err) => Some(err),
            ApiError::Io(err) => Some(err),
            ApiError::Server(err) => Some(err),
            ApiError::Store(err) => Some(err),
            ApiError::Inspection(err) => Some(err),
            ApiError::Validation(_) => None,
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound)
            | ApiError::Inspection(InspectionError::NotFound(_))
            | ApiError::Inspection(InspectionError::Store(StoreError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Config(_)
            | ApiError::Telemetry(_)
            | ApiError::Io(_)
            | ApiError::Server(_)
            | ApiError::Store(_)
            | ApiError::Inspection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for ApiError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for ApiError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<InspectionError> for ApiError {
    fn from(value: InspectionError) -> Self {
        Self::Inspection(value)
    }
}
