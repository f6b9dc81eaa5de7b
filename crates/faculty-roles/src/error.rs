use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::forms::{FormServiceError, IntakeError, ProvisionError};
use crate::workflows::google_workspace::GoogleAuthError;
use crate::workflows::profiles::ProfileTableError;
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
    Server(axum::Error),
    Provision(ProvisionError),
    ProfileTable(ProfileTableError),
    Intake(IntakeError),
    Google(GoogleAuthError),
    Task(tokio::task::JoinError),
    BadRequest(String),
    Disabled(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Provision(err) => write!(f, "form provisioning error: {}", err),
            AppError::ProfileTable(err) => write!(f, "profile table error: {}", err),
            AppError::Intake(err) => write!(f, "form response rejected: {}", err),
            AppError::Google(err) => write!(f, "google workspace error: {}", err),
            AppError::Task(err) => write!(f, "background task failed: {}", err),
            AppError::BadRequest(message) => write!(f, "bad request: {}", message),
            AppError::Disabled(feature) => write!(f, "{} is not enabled", feature),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Provision(err) => Some(err),
            AppError::ProfileTable(err) => Some(err),
            AppError::Intake(err) => Some(err),
            AppError::Google(err) => Some(err),
            AppError::Task(err) => Some(err),
            AppError::BadRequest(_) | AppError::Disabled(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest(_)
            | AppError::Intake(IntakeError::MissingAnswer(_))
            | AppError::Intake(IntakeError::InvalidChoice { .. }) => StatusCode::BAD_REQUEST,
            AppError::Provision(ProvisionError::NotProvisioned)
            | AppError::Intake(IntakeError::Forms(FormServiceError::FormNotFound(_)))
            | AppError::Disabled(_) => StatusCode::NOT_FOUND,
            AppError::Provision(_) | AppError::Intake(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::ProfileTable(_)
            | AppError::Google(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

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

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ProvisionError> for AppError {
    fn from(value: ProvisionError) -> Self {
        Self::Provision(value)
    }
}

impl From<ProfileTableError> for AppError {
    fn from(value: ProfileTableError) -> Self {
        Self::ProfileTable(value)
    }
}

impl From<IntakeError> for AppError {
    fn from(value: IntakeError) -> Self {
        Self::Intake(value)
    }
}

impl From<GoogleAuthError> for AppError {
    fn from(value: GoogleAuthError) -> Self {
        Self::Google(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value)
    }
}
