// roster/src/store/mod.rs

//! Persistence contracts for student records.
//!
//! The store translates orchestrator intents into parameterized queries and
//! returns raw rows. It enforces no business rules; the only meaning it adds
//! is telling "no row matched" and "email already taken" apart from generic
//! database failures.

pub mod filter;
pub mod postgres;

pub use filter::{FilterSet, Predicate};
pub use postgres::PgStudentStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
  NewStudent, StatusChange, StudentDetail, StudentId, StudentPage, StudentQuery, UpdatedStudent, UpsertOutcome,
  UserRecord,
};

/// Postgres SQLSTATE for unique_violation.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("No matching row")]
  NotFound,

  #[error("Unique constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
  UniqueViolation { constraint: Option<String> },

  #[error("Database error: {0}")]
  Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
  fn from(err: sqlx::Error) -> Self {
    if let sqlx::Error::Database(db_err) = &err {
      if db_err.is_unique_violation() || db_err.code().as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        return StoreError::UniqueViolation {
          constraint: db_err.constraint().map(str::to_string),
        };
      }
    }
    if let sqlx::Error::RowNotFound = err {
      return StoreError::NotFound;
    }
    StoreError::Database(err)
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait StudentStore: Send + Sync {
  /// One filtered page plus the total number of matching rows.
  async fn search(&self, query: &StudentQuery) -> StoreResult<StudentPage>;

  /// Creates or updates the account + profile pair through the database routine.
  async fn create_or_update(&self, payload: &NewStudent) -> StoreResult<UpsertOutcome>;

  /// Account, profile and reporter name for `id`; `None` when no row matches.
  async fn detail(&self, id: StudentId) -> StoreResult<Option<StudentDetail>>;

  /// Returns the number of affected rows.
  async fn set_status(&self, change: &StatusChange) -> StoreResult<u64>;

  /// Updates the provided fields only; `StoreError::NotFound` when no row matched.
  async fn update_basic(&self, id: StudentId, name: Option<&str>, email: Option<&str>) -> StoreResult<UpdatedStudent>;

  /// Removes the profile, then the account. Returns the deleted id.
  async fn delete(&self, id: StudentId) -> StoreResult<StudentId>;
}

/// Lookup shared with other user-facing modules.
#[async_trait]
pub trait UserLookup: Send + Sync {
  async fn find_by_id(&self, id: StudentId) -> StoreResult<Option<UserRecord>>;
}
