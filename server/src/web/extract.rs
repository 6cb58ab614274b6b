// roster_server/src/web/extract.rs

use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use roster::StudentId;
use tracing::debug;

use crate::errors::AppError;

pub const INVALID_STUDENT_ID: &str = "Valid student ID is required";

/// `{id}` path segment parsed as a positive student id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentIdPath(pub StudentId);

impl StudentIdPath {
  pub fn parse(raw: &str) -> Result<Self, AppError> {
    match raw.trim().parse::<StudentId>() {
      Ok(id) if id > 0 => Ok(StudentIdPath(id)),
      _ => {
        debug!(raw_id = raw, "Rejecting invalid student id.");
        Err(AppError::BadRequest(INVALID_STUDENT_ID.to_string()))
      }
    }
  }
}

impl FromRequest for StudentIdPath {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(match req.match_info().get("id") {
      Some(raw) => StudentIdPath::parse(raw),
      None => Err(AppError::BadRequest(INVALID_STUDENT_ID.to_string())),
    })
  }
}
