// roster_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use roster::{RosterError, StoreError};
use serde_json::json;
use thiserror::Error;

const GENERIC_FAILURE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
  /// Malformed request caught at the HTTP boundary (ids, body shape).
  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error(transparent)]
  Roster(#[from] RosterError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    AppError::Roster(RosterError::Store(err))
  }
}

// Bootstrap code works in anyhow; keep domain errors intact when they were wrapped.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<RosterError>() {
      Ok(roster_err) => AppError::Roster(roster_err),
      Err(err) => AppError::Internal(format!("{:#}", err)),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Roster(err) => match err {
        RosterError::Validation { .. } => StatusCode::BAD_REQUEST,
        RosterError::NotFound(_) | RosterError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        RosterError::Conflict(_) | RosterError::Store(StoreError::UniqueViolation { .. }) => StatusCode::CONFLICT,
        RosterError::Internal(_) | RosterError::Store(StoreError::Database(_)) | RosterError::Workflow(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Rejecting request");
    }

    let body = match self {
      AppError::BadRequest(m) => json!({"success": false, "message": m}),
      AppError::Roster(RosterError::Validation { message, errors }) if errors.is_empty() => {
        json!({"success": false, "message": message})
      }
      AppError::Roster(RosterError::Validation { message, errors }) => {
        json!({"success": false, "message": message, "errors": errors})
      }
      AppError::Roster(RosterError::NotFound(m) | RosterError::Conflict(m) | RosterError::Internal(m)) => {
        json!({"success": false, "message": m})
      }
      AppError::Roster(RosterError::Store(StoreError::NotFound)) => {
        json!({"success": false, "message": "Resource not found"})
      }
      AppError::Roster(RosterError::Store(StoreError::UniqueViolation { .. })) => {
        json!({"success": false, "message": "Email already in use"})
      }
      // Database, workflow and configuration details stay in the logs.
      _ => json!({"success": false, "message": GENERIC_FAILURE}),
    };

    HttpResponse::build(status).json(body)
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
