// roster/src/error.rs

//! Error taxonomy for student record operations.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Field name to human-readable message, as produced by the validator.
pub type FieldErrors = BTreeMap<String, String>;

pub const STUDENT_NOT_FOUND: &str = "Student not found";

#[derive(Debug, Error)]
pub enum RosterError {
  /// Malformed input, raised before any store access.
  #[error("Validation failed: {message}")]
  Validation { message: String, errors: FieldErrors },

  #[error("Resource not found: {0}")]
  NotFound(String),

  /// Unique email violation surfaced by the store.
  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Internal error: {0}")]
  Internal(String),

  /// Store failure passed through without a more specific business meaning.
  #[error("Store error: {0}")]
  Store(#[from] StoreError),

  #[error("Workflow error: {0}")]
  Workflow(#[from] WorkflowError),
}

impl RosterError {
  pub fn validation(message: impl Into<String>) -> Self {
    RosterError::Validation {
      message: message.into(),
      errors: FieldErrors::new(),
    }
  }

  pub fn student_not_found() -> Self {
    RosterError::NotFound(STUDENT_NOT_FOUND.to_string())
  }
}

pub type Result<T, E = RosterError> = std::result::Result<T, E>;
