use crate::config::ConfigError;
use crate::report::ReportError;
use crate::scoring::ValidationError;
use crate::telemetry::TelemetryError;
use crate::workbook::WorkbookError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Workbook(WorkbookError),
    Report(ReportError),
    Validation(ValidationError),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Workbook(err) if err.is_lock_timeout() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Workbook(err) if err.validation().is_some() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Report(err) if err.is_lock_timeout() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Report(err) if err.validation().is_some() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Workbook(_)
            | AppError::Report(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Workbook(err) => write!(f, "workbook error: {}", err),
            AppError::Report(err) => write!(f, "report error: {}", err),
            AppError::Validation(err) => write!(f, "validation error: {}", err),
            AppError::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Workbook(err) => Some(err),
            AppError::Report(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Internal(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<WorkbookError> for AppError {
    fn from(value: WorkbookError) -> Self {
        Self::Workbook(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
