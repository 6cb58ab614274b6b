// roster/src/service.rs

//! Student orchestrator: existence checks, business rules and the
//! create-then-notify enrollment flow on top of the store contracts.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, RosterError};
use crate::model::{
  Acknowledgement, Enrollment, EnrollmentData, NewStudent, Pagination, StatusChange, StudentId, StudentList,
  StudentQuery, StudentRecord, StudentUpdate, StudentUpdated, UpsertOutcome, UserRecord,
};
use crate::notify::{Notifier, VerificationRequest};
use crate::store::{StoreError, StudentStore, UserLookup};
use crate::workflow::{ContextData, Pipeline, PipelineControl, PipelineResult};

pub const ADD_STUDENT_AND_EMAIL_SEND_SUCCESS: &str = "Student added and verification email sent successfully.";
pub const ADD_STUDENT_BUT_EMAIL_SEND_FAIL: &str = "Student added, but failed to send verification email.";
pub const UNABLE_TO_ADD_STUDENT: &str = "Unable to add student";
pub const DUPLICATE_STUDENT_EMAIL: &str = "A student with this email already exists";
pub const UPDATE_NEEDS_A_FIELD: &str = "At least one field (name or email) must be provided for update";
pub const EMAIL_IN_USE: &str = "Email already in use";
pub const UNABLE_TO_UPDATE_STUDENT: &str = "Unable to update student";
pub const UNABLE_TO_CHANGE_STATUS: &str = "Unable to change student status";

pub const PERSIST_STEP: &str = "persist_student";
pub const VERIFICATION_STEP: &str = "send_verification_email";

/// Data shared by the enrollment pipeline steps.
#[derive(Debug, Clone)]
pub struct EnrollmentCtx {
  pub payload: NewStudent,
  pub saved: Option<EnrollmentData>,
  pub verification_sent: bool,
}

pub struct StudentService {
  store: Arc<dyn StudentStore>,
  users: Arc<dyn UserLookup>,
  enrollment: Pipeline<EnrollmentCtx, RosterError>,
}

impl StudentService {
  pub fn new(store: Arc<dyn StudentStore>, users: Arc<dyn UserLookup>, notifier: Arc<dyn Notifier>) -> Result<Self> {
    let enrollment = enrollment_pipeline(Arc::clone(&store), notifier)?;
    Ok(Self {
      store,
      users,
      enrollment,
    })
  }

  /// Existence check shared by every single-student operation.
  async fn ensure_student_exists(&self, id: StudentId) -> Result<UserRecord> {
    match self.users.find_by_id(id).await? {
      Some(user) => Ok(user),
      None => {
        debug!(student_id = id, "Student lookup missed.");
        Err(RosterError::student_not_found())
      }
    }
  }

  #[instrument(name = "service::list", skip(self))]
  pub async fn list(&self, query: StudentQuery) -> Result<StudentList> {
    let query = query.normalized();
    let page = self.store.search(&query).await?;
    let pagination = Pagination::new(page.total, query.page, query.limit);

    Ok(StudentList {
      success: true,
      data: page.students,
      pagination,
    })
  }

  #[instrument(name = "service::detail", skip(self))]
  pub async fn detail(&self, id: StudentId) -> Result<StudentRecord> {
    self.ensure_student_exists(id).await?;

    // The row can disappear between the lookup and the join.
    let student = self
      .store
      .detail(id)
      .await?
      .ok_or_else(RosterError::student_not_found)?;

    Ok(StudentRecord {
      success: true,
      data: student,
    })
  }

  /// Persists the student, then tries to send the verification email.
  /// A failed email only changes the returned message.
  #[instrument(name = "service::create", skip(self, payload), fields(email = %payload.email))]
  pub async fn create(&self, payload: NewStudent) -> Result<Enrollment> {
    let ctx = ContextData::new(EnrollmentCtx {
      payload,
      saved: None,
      verification_sent: false,
    });

    let summary = self.enrollment.run(ctx.clone()).await?;
    if summary.result == PipelineResult::Stopped {
      error!("Enrollment pipeline stopped before completion.");
      return Err(RosterError::Internal(UNABLE_TO_ADD_STUDENT.to_string()));
    }

    let guard = ctx.read();
    let data = guard.saved.clone().ok_or_else(|| {
      error!("Enrollment completed without a saved student.");
      RosterError::Internal(UNABLE_TO_ADD_STUDENT.to_string())
    })?;
    let verification_sent = guard.verification_sent;
    let message = if verification_sent {
      ADD_STUDENT_AND_EMAIL_SEND_SUCCESS
    } else {
      ADD_STUDENT_BUT_EMAIL_SEND_FAIL
    };

    info!(user_id = data.user_id, verification_sent, "Student added.");
    Ok(Enrollment {
      success: true,
      data,
      message: message.to_string(),
      verification_email_sent: verification_sent,
    })
  }

  #[instrument(name = "service::update", skip(self, update))]
  pub async fn update(&self, id: StudentId, update: StudentUpdate) -> Result<StudentUpdated> {
    self.ensure_student_exists(id).await?;

    if update.is_empty() {
      return Err(RosterError::validation(UPDATE_NEEDS_A_FIELD));
    }

    match self.store.update_basic(id, update.name(), update.email()).await {
      Ok(updated) => Ok(StudentUpdated {
        success: true,
        message: "Student updated successfully".to_string(),
        updated,
      }),
      Err(StoreError::NotFound) => Err(RosterError::student_not_found()),
      Err(StoreError::UniqueViolation { .. }) => Err(RosterError::Conflict(EMAIL_IN_USE.to_string())),
      Err(e) => {
        error!(error = %e, "Student update failed.");
        Err(RosterError::Internal(UNABLE_TO_UPDATE_STUDENT.to_string()))
      }
    }
  }

  #[instrument(name = "service::set_status", skip(self))]
  pub async fn set_status(&self, id: StudentId, is_active: bool) -> Result<Acknowledgement> {
    self.ensure_student_exists(id).await?;

    // Reviewer attribution is not wired yet; the column is written as NULL.
    let change = StatusChange {
      user_id: id,
      reviewer_id: None,
      is_active,
    };
    let affected = self.store.set_status(&change).await?;
    if affected == 0 {
      warn!(student_id = id, "Status update matched no rows.");
      return Err(RosterError::Internal(UNABLE_TO_CHANGE_STATUS.to_string()));
    }

    Ok(Acknowledgement::ok("Student status changed successfully"))
  }

  #[instrument(name = "service::delete", skip(self))]
  pub async fn delete(&self, id: StudentId) -> Result<Acknowledgement> {
    self.ensure_student_exists(id).await?;

    match self.store.delete(id).await {
      Ok(_) => Ok(Acknowledgement::ok("Student deleted successfully")),
      Err(StoreError::NotFound) => Err(RosterError::student_not_found()),
      Err(e) => Err(e.into()),
    }
  }
}

fn enrollment_pipeline(
  store: Arc<dyn StudentStore>,
  notifier: Arc<dyn Notifier>,
) -> Result<Pipeline<EnrollmentCtx, RosterError>> {
  let mut pipeline = Pipeline::new(&[(PERSIST_STEP, false), (VERIFICATION_STEP, true)]);

  pipeline
    .on(PERSIST_STEP, move |ctx| persist_student(Arc::clone(&store), ctx))?
    .on(VERIFICATION_STEP, move |ctx| send_verification(Arc::clone(&notifier), ctx))?;

  Ok(pipeline)
}

async fn persist_student(store: Arc<dyn StudentStore>, ctx: ContextData<EnrollmentCtx>) -> Result<PipelineControl> {
  let payload = ctx.read().payload.clone();

  match store.create_or_update(&payload).await {
    Ok(UpsertOutcome::Saved { user_id, message }) => {
      ctx.write().saved = Some(EnrollmentData { user_id, message });
      Ok(PipelineControl::Continue)
    }
    Ok(UpsertOutcome::Rejected { message }) => {
      warn!(routine_message = %message, "Student routine rejected the payload.");
      Err(RosterError::Internal(UNABLE_TO_ADD_STUDENT.to_string()))
    }
    Err(StoreError::UniqueViolation { .. }) => Err(RosterError::Conflict(DUPLICATE_STUDENT_EMAIL.to_string())),
    Err(e) => {
      error!(error = %e, "Student routine failed.");
      Err(RosterError::Internal(UNABLE_TO_ADD_STUDENT.to_string()))
    }
  }
}

async fn send_verification(notifier: Arc<dyn Notifier>, ctx: ContextData<EnrollmentCtx>) -> Result<PipelineControl> {
  let (user_id, user_email) = {
    let guard = ctx.read();
    (guard.saved.as_ref().map(|s| s.user_id), guard.payload.email.clone())
  };

  let Some(user_id) = user_id else {
    warn!("No saved student to verify, skipping verification email.");
    return Ok(PipelineControl::Continue);
  };

  let receipt = notifier
    .send_verification_email(VerificationRequest { user_id, user_email })
    .await
    .map_err(|e| RosterError::Internal(format!("Verification email failed: {e}")))?;

  ctx.write().verification_sent = true;
  debug!(user_id, message_id = %receipt.message_id, "Verification email sent.");
  Ok(PipelineControl::Continue)
}
