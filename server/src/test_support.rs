// roster_server/src/test_support.rs

//! In-memory store used by the route tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use roster::{
  NewStudent, StatusChange, StoreError, StoreResult, StudentDetail, StudentId, StudentPage, StudentQuery,
  StudentService, StudentStore, StudentSummary, UpdatedStudent, UpsertOutcome, UserLookup, UserRecord,
};

use crate::config::AppConfig;
use crate::services::MockMailer;
use crate::state::AppState;

#[derive(Clone, Default)]
pub struct FakeBackend {
  rows: Arc<Mutex<BTreeMap<StudentId, StudentDetail>>>,
  creates: Arc<AtomicUsize>,
}

impl FakeBackend {
  /// Seeds `count` students named "Ana 1".."Ana n", ids starting at 1.
  pub fn with_students(count: i32) -> Self {
    let backend = Self::default();
    {
      let mut rows = backend.rows.lock();
      for id in 1..=count {
        rows.insert(id, detail(id, &format!("Ana {id}"), &format!("ana{id}@school.test")));
      }
    }
    backend
  }

  pub fn create_calls(&self) -> usize {
    self.creates.load(Ordering::SeqCst)
  }
}

fn detail(id: StudentId, name: &str, email: &str) -> StudentDetail {
  StudentDetail {
    id,
    name: name.to_string(),
    email: email.to_string(),
    system_access: false,
    last_login: None,
    phone: None,
    gender: None,
    dob: None,
    class: None,
    section: None,
    roll: None,
    father_name: None,
    father_phone: None,
    mother_name: None,
    mother_phone: None,
    guardian_name: None,
    guardian_phone: None,
    relation_of_guardian: None,
    current_address: None,
    permanent_address: None,
    admission_date: None,
    reporter_name: None,
    status_last_reviewed_at: None,
    updated_at: None,
  }
}

#[async_trait]
impl StudentStore for FakeBackend {
  async fn search(&self, query: &StudentQuery) -> StoreResult<StudentPage> {
    let needle = query.search.to_lowercase();
    let rows = self.rows.lock();
    let matching: Vec<StudentSummary> = rows
      .values()
      .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle) || s.email.to_lowercase().contains(&needle))
      .filter(|s| query.class.is_none() || s.class == query.class)
      .filter(|s| query.section.is_none() || s.section == query.section)
      .map(|s| StudentSummary {
        id: s.id,
        name: s.name.clone(),
        email: s.email.clone(),
        last_login: s.last_login,
        system_access: s.system_access,
        class: s.class.clone(),
        section: s.section.clone(),
        roll: s.roll,
      })
      .collect();

    let total = matching.len() as i64;
    let students = matching
      .into_iter()
      .skip(query.offset() as usize)
      .take(query.limit as usize)
      .collect();
    Ok(StudentPage { students, total })
  }

  async fn create_or_update(&self, payload: &NewStudent) -> StoreResult<UpsertOutcome> {
    self.creates.fetch_add(1, Ordering::SeqCst);
    let mut rows = self.rows.lock();
    if rows.values().any(|s| s.email.eq_ignore_ascii_case(&payload.email)) {
      return Err(StoreError::UniqueViolation {
        constraint: Some("users_email_key".to_string()),
      });
    }

    let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
    let mut row = detail(id, &payload.name, &payload.email);
    row.class = payload.class_name.clone();
    row.section = payload.section_name.clone();
    row.roll = payload.roll;
    rows.insert(id, row);
    Ok(UpsertOutcome::Saved {
      user_id: id,
      message: "Student created successfully".to_string(),
    })
  }

  async fn detail(&self, id: StudentId) -> StoreResult<Option<StudentDetail>> {
    Ok(self.rows.lock().get(&id).cloned())
  }

  async fn set_status(&self, change: &StatusChange) -> StoreResult<u64> {
    let mut rows = self.rows.lock();
    Ok(match rows.get_mut(&change.user_id) {
      Some(row) => {
        row.system_access = change.is_active;
        1
      }
      None => 0,
    })
  }

  async fn update_basic(&self, id: StudentId, name: Option<&str>, email: Option<&str>) -> StoreResult<UpdatedStudent> {
    let mut rows = self.rows.lock();
    let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
    if let Some(name) = name {
      row.name = name.to_string();
    }
    if let Some(email) = email {
      row.email = email.to_string();
    }
    Ok(UpdatedStudent {
      id,
      name: row.name.clone(),
      email: row.email.clone(),
    })
  }

  async fn delete(&self, id: StudentId) -> StoreResult<StudentId> {
    self.rows.lock().remove(&id).map(|_| id).ok_or(StoreError::NotFound)
  }
}

#[async_trait]
impl UserLookup for FakeBackend {
  async fn find_by_id(&self, id: StudentId) -> StoreResult<Option<UserRecord>> {
    Ok(self.rows.lock().get(&id).map(|s| UserRecord {
      id: s.id,
      name: s.name.clone(),
      email: s.email.clone(),
    }))
  }
}

pub fn seeded_app_state(backend: &FakeBackend) -> AppState {
  let config = AppConfig::from_lookup(|name| match name {
    "DATABASE_URL" => Some("postgres://localhost/roster_test".to_string()),
    _ => None,
  })
  .unwrap();
  let mailer = MockMailer::new(config.mail_sender.clone(), config.app_base_url.clone());
  let students = StudentService::new(Arc::new(backend.clone()), Arc::new(backend.clone()), Arc::new(mailer)).unwrap();

  AppState {
    students: Arc::new(students),
  }
}
