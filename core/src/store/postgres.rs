// roster/src/store/postgres.rs

//! `StudentStore` and `UserLookup` over a Postgres pool.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};

use super::filter::FilterSet;
use super::{StoreError, StoreResult, StudentStore, UserLookup};
use crate::model::{
  NewStudent, StatusChange, StudentDetail, StudentId, StudentPage, StudentQuery, StudentSummary, UpdatedStudent,
  UpsertOutcome, UserRecord,
};

const DETAIL_QUERY: &str = r#"
  SELECT
    u.id,
    u.name,
    u.email,
    COALESCE(u.is_active, false) AS system_access,
    u.last_login::timestamptz AS last_login,
    p.phone,
    p.gender,
    p.dob::date AS dob,
    p.class_name AS class,
    p.section_name AS section,
    p.roll::int4 AS roll,
    p.father_name,
    p.father_phone,
    p.mother_name,
    p.mother_phone,
    p.guardian_name,
    p.guardian_phone,
    p.relation_of_guardian,
    p.current_address,
    p.permanent_address,
    p.admission_dt::date AS admission_date,
    r.name AS reporter_name,
    u.status_last_reviewed_dt::timestamptz AS status_last_reviewed_at,
    u.updated_dt::timestamptz AS updated_at
  FROM users u
  LEFT JOIN user_profiles p ON u.id = p.user_id
  LEFT JOIN users r ON u.reporter_id = r.id
  WHERE u.id = $1"#;

const SET_STATUS_QUERY: &str = r#"
  UPDATE users
  SET
    is_active = $1,
    status_last_reviewed_dt = $2,
    status_last_reviewer_id = $3
  WHERE id = $4"#;

const UPDATE_BASIC_QUERY: &str = r#"
  UPDATE users
  SET name = COALESCE($1, name), email = COALESCE($2, email), updated_dt = NOW()
  WHERE id = $3
  RETURNING id, name, email"#;

#[derive(Debug, Clone)]
pub struct PgStudentStore {
  pool: PgPool,
  student_role_id: i32,
}

impl PgStudentStore {
  pub fn new(pool: PgPool, student_role_id: i32) -> Self {
    Self { pool, student_role_id }
  }

  /// Looks up a role id by case-insensitive name.
  #[instrument(name = "store::resolve_role_id", skip(pool), err(Display))]
  pub async fn resolve_role_id(pool: &PgPool, role_name: &str) -> StoreResult<i32> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name ILIKE $1")
      .bind(role_name)
      .fetch_optional(pool)
      .await?
      .ok_or(StoreError::NotFound)
  }
}

#[async_trait]
impl StudentStore for PgStudentStore {
  #[instrument(name = "store::search", skip(self), err(Display))]
  async fn search(&self, query: &StudentQuery) -> StoreResult<StudentPage> {
    let filters = FilterSet::for_query(self.student_role_id, query);

    let page_sql = filters.page_sql();
    let page_args = filters.page_arguments(i64::from(query.limit), query.offset())?;
    let students = sqlx::query_as_with::<_, StudentSummary, _>(&page_sql, page_args)
      .fetch_all(&self.pool)
      .await?;

    let count_sql = filters.count_sql();
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, filters.count_arguments()?)
      .fetch_one(&self.pool)
      .await?;

    debug!(rows = students.len(), total, "Student search finished.");
    Ok(StudentPage { students, total })
  }

  #[instrument(name = "store::create_or_update", skip(self, payload), fields(email = %payload.email), err(Display))]
  async fn create_or_update(&self, payload: &NewStudent) -> StoreResult<UpsertOutcome> {
    let row = sqlx::query("SELECT * FROM student_add_update($1)")
      .bind(sqlx::types::Json(payload))
      .fetch_one(&self.pool)
      .await?;

    let status: Option<bool> = row.try_get("status")?;
    let message: Option<String> = row.try_get("message")?;
    let user_id: Option<StudentId> = row.try_get("userId")?;
    let message = message.unwrap_or_default();

    Ok(match (status, user_id) {
      (Some(true), Some(user_id)) => UpsertOutcome::Saved { user_id, message },
      (Some(true), None) => {
        warn!("Routine reported success without a user id.");
        UpsertOutcome::Rejected { message }
      }
      _ => UpsertOutcome::Rejected { message },
    })
  }

  #[instrument(name = "store::detail", skip(self), err(Display))]
  async fn detail(&self, id: StudentId) -> StoreResult<Option<StudentDetail>> {
    let detail = sqlx::query_as::<_, StudentDetail>(DETAIL_QUERY)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(detail)
  }

  #[instrument(name = "store::set_status", skip(self), err(Display))]
  async fn set_status(&self, change: &StatusChange) -> StoreResult<u64> {
    let result = sqlx::query(SET_STATUS_QUERY)
      .bind(change.is_active)
      .bind(Utc::now())
      .bind(change.reviewer_id)
      .bind(change.user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  #[instrument(name = "store::update_basic", skip(self), err(Display))]
  async fn update_basic(&self, id: StudentId, name: Option<&str>, email: Option<&str>) -> StoreResult<UpdatedStudent> {
    sqlx::query_as::<_, UpdatedStudent>(UPDATE_BASIC_QUERY)
      .bind(name)
      .bind(email)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or(StoreError::NotFound)
  }

  #[instrument(name = "store::delete", skip(self), err(Display))]
  async fn delete(&self, id: StudentId) -> StoreResult<StudentId> {
    let mut tx = self.pool.begin().await?;

    // Profile rows reference the account; remove them first.
    sqlx::query("DELETE FROM user_profiles WHERE user_id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;

    let deleted = sqlx::query_scalar::<_, StudentId>("DELETE FROM users WHERE id = $1 RETURNING id")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?;

    match deleted {
      Some(deleted_id) => {
        tx.commit().await?;
        Ok(deleted_id)
      }
      None => {
        tx.rollback().await?;
        Err(StoreError::NotFound)
      }
    }
  }
}

#[async_trait]
impl UserLookup for PgStudentStore {
  #[instrument(name = "store::find_user_by_id", skip(self), err(Display))]
  async fn find_by_id(&self, id: StudentId) -> StoreResult<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>("SELECT id, name, email FROM users WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(user)
  }
}
