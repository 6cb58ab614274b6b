// roster/src/validation.rs

//! Shape/format checks for incoming student payloads. Pure, no store access.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldErrors, RosterError};
use crate::model::StudentUpdate;

// local@domain.tld, no whitespace, exactly one '@'.
static EMAIL_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

pub const VALIDATION_FAILED: &str = "Validation failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
  pub is_valid: bool,
  pub errors: FieldErrors,
}

impl ValidationReport {
  /// Turns a failed report into `RosterError::Validation`.
  pub fn into_result(self) -> Result<(), RosterError> {
    if self.is_valid {
      Ok(())
    } else {
      Err(RosterError::Validation {
        message: VALIDATION_FAILED.to_string(),
        errors: self.errors,
      })
    }
  }
}

pub fn is_valid_name(name: &str) -> bool {
  !name.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_PATTERN.is_match(email)
}

/// Checks the `{name, email}` pair required to create a student.
pub fn validate_new_student(name: Option<&str>, email: Option<&str>) -> ValidationReport {
  let mut errors = FieldErrors::new();

  if !name.is_some_and(is_valid_name) {
    errors.insert("name".to_string(), "Name is required".to_string());
  }
  if !email.is_some_and(is_valid_email) {
    errors.insert("email".to_string(), "Valid email is required".to_string());
  }

  ValidationReport {
    is_valid: errors.is_empty(),
    errors,
  }
}

/// Checks the format of an email supplied on update. Absent or blank fields are
/// left to the orchestrator's "at least one field" rule.
pub fn validate_student_update(update: &StudentUpdate) -> ValidationReport {
  let mut errors = FieldErrors::new();

  if update.email().is_some_and(|email| !is_valid_email(email)) {
    errors.insert("email".to_string(), "Valid email is required".to_string());
  }

  ValidationReport {
    is_valid: errors.is_empty(),
    errors,
  }
}
