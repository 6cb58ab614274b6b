// roster/src/model.rs

//! Records, payloads and response envelopes for student operations.
//!
//! Rows coming out of the store keep snake_case column names (`FromRow`),
//! while everything serialized back to callers is camelCase.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type StudentId = i32;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

// --- Store rows ---

/// One row of the paginated student list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
  pub id: StudentId,
  pub name: String,
  pub email: String,
  pub last_login: Option<DateTime<Utc>>,
  pub system_access: bool,
  pub class: Option<String>,
  pub section: Option<String>,
  pub roll: Option<i32>,
}

/// Flattened account + profile + reporter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
  pub id: StudentId,
  pub name: String,
  pub email: String,
  pub system_access: bool,
  pub last_login: Option<DateTime<Utc>>,
  pub phone: Option<String>,
  pub gender: Option<String>,
  pub dob: Option<NaiveDate>,
  pub class: Option<String>,
  pub section: Option<String>,
  pub roll: Option<i32>,
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
  pub reporter_name: Option<String>,
  pub status_last_reviewed_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
}

/// Identity row returned by a basic-field update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UpdatedStudent {
  pub id: StudentId,
  pub name: String,
  pub email: String,
}

/// Minimal user row used for existence checks.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
  pub id: StudentId,
  pub name: String,
  pub email: String,
}

/// Result of one page of a filtered search, before it is wrapped for callers.
#[derive(Debug, Clone, Default)]
pub struct StudentPage {
  pub students: Vec<StudentSummary>,
  pub total: i64,
}

// --- Inputs ---

/// List/search parameters. `page` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentQuery {
  pub page: u32,
  pub limit: u32,
  pub search: String,
  pub class: Option<String>,
  pub section: Option<String>,
}

impl Default for StudentQuery {
  fn default() -> Self {
    Self {
      page: DEFAULT_PAGE,
      limit: DEFAULT_PAGE_LIMIT,
      search: String::new(),
      class: None,
      section: None,
    }
  }
}

impl StudentQuery {
  /// Clamps page/limit into range and drops blank filters.
  pub fn normalized(mut self) -> Self {
    if self.page == 0 {
      self.page = DEFAULT_PAGE;
    }
    if self.limit == 0 {
      self.limit = DEFAULT_PAGE_LIMIT;
    }
    self.limit = self.limit.min(MAX_PAGE_LIMIT);
    self.search = self.search.trim().to_string();
    self.class = self.class.filter(|c| !c.trim().is_empty());
    self.section = self.section.filter(|s| !s.trim().is_empty());
    self
  }

  pub fn offset(&self) -> i64 {
    (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
  }
}

/// Payload handed to the create-or-update routine. Serialized as-is (snake_case)
/// into the routine's JSON argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
  pub name: String,
  pub email: String,
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

/// Basic-field update. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentUpdate {
  pub name: Option<String>,
  pub email: Option<String>,
}

impl StudentUpdate {
  pub fn name(&self) -> Option<&str> {
    non_blank(self.name.as_deref())
  }

  pub fn email(&self) -> Option<&str> {
    non_blank(self.email.as_deref())
  }

  pub fn is_empty(&self) -> bool {
    self.name().is_none() && self.email().is_none()
  }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// Status transition with review bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
  pub user_id: StudentId,
  pub reviewer_id: Option<StudentId>,
  pub is_active: bool,
}

/// Structured result of the create-or-update routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
  Saved { user_id: StudentId, message: String },
  Rejected { message: String },
}

// --- Response envelopes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub total: i64,
  pub page: u32,
  pub limit: u32,
  pub total_pages: i64,
}

impl Pagination {
  pub fn new(total: i64, page: u32, limit: u32) -> Self {
    let limit_i = i64::from(limit.max(1));
    let total_pages = if total <= 0 { 0 } else { (total + limit_i - 1) / limit_i };
    Self {
      total,
      page,
      limit,
      total_pages,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentList {
  pub success: bool,
  pub data: Vec<StudentSummary>,
  pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
  pub success: bool,
  pub data: StudentDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentData {
  pub user_id: StudentId,
  pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  pub success: bool,
  pub data: EnrollmentData,
  pub message: String,
  pub verification_email_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentUpdated {
  pub success: bool,
  pub message: String,
  pub updated: UpdatedStudent,
}

/// Plain `{success, message}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
  pub success: bool,
  pub message: String,
}

impl Acknowledgement {
  pub fn ok(message: impl Into<String>) -> Self {
    Self {
      success: true,
      message: message.into(),
    }
  }
}
