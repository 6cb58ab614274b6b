// roster_server/src/web/handlers/student_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDate;
use roster::{validate_new_student, validate_student_update, NewStudent, StudentId, StudentQuery, StudentUpdate};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extract::StudentIdPath;

pub const INVALID_STATUS_FLAG: &str = "is_active must be a boolean value (true/false)";

// --- Request DTOs ---

/// Query string of `GET /students`. Paging values that do not parse fall back to defaults.
#[derive(Debug, Default)]
pub struct ListStudentsQuery {
  pub page: Option<String>,
  pub limit: Option<String>,
  pub search: Option<String>,
  pub class: Option<String>,
  pub section: Option<String>,
}

impl ListStudentsQuery {
  /// Reads the raw query string pair by pair so a malformed or repeated key
  /// never rejects the request. The last occurrence of a key wins; unknown keys are ignored.
  fn from_query_string(raw: &str) -> Self {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(raw)
      .map(web::Query::into_inner)
      .unwrap_or_default();

    let mut query = Self::default();
    for (key, value) in pairs {
      match key.as_str() {
        "page" => query.page = Some(value),
        "limit" => query.limit = Some(value),
        "search" => query.search = Some(value),
        "class" => query.class = Some(value),
        "section" => query.section = Some(value),
        _ => {}
      }
    }
    query
  }

  fn into_student_query(self) -> StudentQuery {
    let defaults = StudentQuery::default();
    StudentQuery {
      page: parse_or(self.page.as_deref(), defaults.page),
      limit: parse_or(self.limit.as_deref(), defaults.limit),
      search: self.search.unwrap_or_default(),
      class: self.class,
      section: self.section,
    }
  }
}

fn parse_or(raw: Option<&str>, default: u32) -> u32 {
  raw.and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(default)
}

/// Body shared by create and update.
#[derive(Deserialize, Debug, Default)]
pub struct StudentPayload {
  pub name: Option<String>,
  pub email: Option<String>,
  pub class_name: Option<String>,
  pub section_name: Option<String>,
  pub roll: Option<i32>,
  pub dob: Option<NaiveDate>,
  pub phone: Option<String>,
  pub gender: Option<String>,
  pub father_name: Option<String>,
  pub father_phone: Option<String>,
  pub mother_name: Option<String>,
  pub mother_phone: Option<String>,
  pub guardian_name: Option<String>,
  pub guardian_phone: Option<String>,
  pub relation_of_guardian: Option<String>,
  pub current_address: Option<String>,
  pub permanent_address: Option<String>,
  pub admission_date: Option<NaiveDate>,
  pub reporter_id: Option<StudentId>,
}

impl StudentPayload {
  fn into_new_student(self) -> NewStudent {
    NewStudent {
      name: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
      email: self.email.map(|e| e.trim().to_string()).unwrap_or_default(),
      class_name: self.class_name,
      section_name: self.section_name,
      roll: self.roll,
      dob: self.dob,
      phone: self.phone,
      gender: self.gender,
      father_name: self.father_name,
      father_phone: self.father_phone,
      mother_name: self.mother_name,
      mother_phone: self.mother_phone,
      guardian_name: self.guardian_name,
      guardian_phone: self.guardian_phone,
      relation_of_guardian: self.relation_of_guardian,
      current_address: self.current_address,
      permanent_address: self.permanent_address,
      admission_date: self.admission_date,
      reporter_id: self.reporter_id,
    }
  }
}

// --- Handler Implementations ---

#[instrument(name = "handler::list_students", skip(app_state, req))]
pub async fn list_students_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  let query = ListStudentsQuery::from_query_string(req.query_string()).into_student_query();
  let result = app_state.students.list(query).await?;
  info!("Listed {} of {} students.", result.data.len(), result.pagination.total);
  Ok(HttpResponse::Ok().json(result))
}

#[instrument(name = "handler::get_student", skip(app_state), fields(student_id = id.0))]
pub async fn get_student_handler(
  app_state: web::Data<AppState>,
  id: StudentIdPath,
) -> Result<HttpResponse, AppError> {
  let result = app_state.students.detail(id.0).await?;
  Ok(HttpResponse::Ok().json(result))
}

#[instrument(name = "handler::create_student", skip(app_state, req_payload))]
pub async fn create_student_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<StudentPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  validate_new_student(payload.name.as_deref(), payload.email.as_deref()).into_result()?;

  let result = app_state.students.create(payload.into_new_student()).await?;
  info!(
    "Student created. User ID: {}. Verification email sent: {}",
    result.data.user_id, result.verification_email_sent
  );
  Ok(HttpResponse::Created().json(result))
}

#[instrument(name = "handler::update_student", skip(app_state, req_payload), fields(student_id = id.0))]
pub async fn update_student_handler(
  app_state: web::Data<AppState>,
  id: StudentIdPath,
  req_payload: web::Json<StudentPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let update = StudentUpdate {
    name: payload.name,
    email: payload.email,
  };
  validate_student_update(&update).into_result()?;

  let result = app_state.students.update(id.0, update).await?;
  Ok(HttpResponse::Ok().json(result))
}

#[instrument(name = "handler::set_student_status", skip(app_state, req_payload), fields(student_id = id.0))]
pub async fn set_student_status_handler(
  app_state: web::Data<AppState>,
  id: StudentIdPath,
  req_payload: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
  let is_active = req_payload
    .get("is_active")
    .and_then(Value::as_bool)
    .ok_or_else(|| AppError::BadRequest(INVALID_STATUS_FLAG.to_string()))?;

  let result = app_state.students.set_status(id.0, is_active).await?;
  Ok(HttpResponse::Ok().json(result))
}

#[instrument(name = "handler::delete_student", skip(app_state), fields(student_id = id.0))]
pub async fn delete_student_handler(
  app_state: web::Data<AppState>,
  id: StudentIdPath,
) -> Result<HttpResponse, AppError> {
  let result = app_state.students.delete(id.0).await?;
  info!("Student {} deleted.", id.0);
  Ok(HttpResponse::Ok().json(result))
}
