// roster/src/lib.rs

//! Roster: student record orchestration for a school-administration backend.
//!
//! Three layers, each depending only on the one below:
//!  - [`validation`] checks payload shape before anything touches the store.
//!  - [`service::StudentService`] enforces existence checks and business rules,
//!    and runs enrollment as a two-step [`workflow::Pipeline`] (persist, then a
//!    best-effort verification email).
//!  - [`store`] turns intents into parameterized Postgres queries.
//!
//! Persistence is authoritative; notification is not. A failed verification
//! email never rolls back or fails a successful create.

pub mod error;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;
pub mod validation;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::error::{FieldErrors, Result, RosterError};
pub use crate::model::{
  Acknowledgement, Enrollment, EnrollmentData, NewStudent, Pagination, StatusChange, StudentDetail, StudentId,
  StudentList, StudentPage, StudentQuery, StudentRecord, StudentSummary, StudentUpdate, StudentUpdated, UpdatedStudent,
  UpsertOutcome, UserRecord,
};
pub use crate::notify::{Notifier, NotifyError, VerificationReceipt, VerificationRequest};
pub use crate::service::StudentService;
pub use crate::store::{PgStudentStore, StoreError, StoreResult, StudentStore, UserLookup};
pub use crate::validation::{validate_new_student, validate_student_update, ValidationReport};
