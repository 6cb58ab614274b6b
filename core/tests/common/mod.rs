// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use parking_lot::Mutex;
use roster::{
  NewStudent, Notifier, NotifyError, StatusChange, StoreError, StoreResult, StudentDetail, StudentId, StudentPage,
  StudentQuery, StudentService, StudentStore, StudentSummary, UpdatedStudent, UpsertOutcome, UserLookup, UserRecord,
  VerificationReceipt, VerificationRequest,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;

// --- Stored record ---
#[derive(Clone, Debug)]
pub struct StoredStudent {
  pub id: StudentId,
  pub name: String,
  pub email: String,
  pub is_active: bool,
  pub class: Option<String>,
  pub section: Option<String>,
  pub roll: Option<i32>,
  pub reviewer_id: Option<StudentId>,
  pub reviewed: bool,
}

impl StoredStudent {
  fn summary(&self) -> StudentSummary {
    StudentSummary {
      id: self.id,
      name: self.name.clone(),
      email: self.email.clone(),
      last_login: None,
      system_access: self.is_active,
      class: self.class.clone(),
      section: self.section.clone(),
      roll: self.roll,
    }
  }

  fn detail(&self) -> StudentDetail {
    StudentDetail {
      id: self.id,
      name: self.name.clone(),
      email: self.email.clone(),
      system_access: self.is_active,
      last_login: None,
      phone: None,
      gender: None,
      dob: None,
      class: self.class.clone(),
      section: self.section.clone(),
      roll: self.roll,
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
}

// --- Call counters ---
#[derive(Debug, Default)]
pub struct CallCounts {
  pub search: AtomicUsize,
  pub create_or_update: AtomicUsize,
  pub detail: AtomicUsize,
  pub set_status: AtomicUsize,
  pub update_basic: AtomicUsize,
  pub delete: AtomicUsize,
  pub find_by_id: AtomicUsize,
}

impl CallCounts {
  pub fn get(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
  }

  pub fn store_calls(&self) -> usize {
    [
      &self.search,
      &self.create_or_update,
      &self.detail,
      &self.set_status,
      &self.update_basic,
      &self.delete,
    ]
    .iter()
    .map(|c| c.load(Ordering::SeqCst))
    .sum()
  }
}

#[derive(Debug, Default)]
struct StoreState {
  students: BTreeMap<StudentId, StoredStudent>,
  next_id: StudentId,
  // Ids the lookup still reports after the row is gone (read/write race).
  ghosts: HashSet<StudentId>,
}

/// In-memory stand-in for the Postgres store and the shared user lookup.
#[derive(Debug, Default)]
pub struct InMemoryStore {
  state: Mutex<StoreState>,
  pub calls: CallCounts,
  reject_creates_with: Mutex<Option<String>>,
  status_matches_nothing: AtomicBool,
  fail_updates: AtomicBool,
  fail_deletes: AtomicBool,
  fail_lookups: AtomicBool,
}

impl InMemoryStore {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn seed(&self, name: &str, email: &str, class: Option<&str>, section: Option<&str>) -> StudentId {
    let mut state = self.state.lock();
    state.next_id += 1;
    let id = state.next_id;
    state.students.insert(
      id,
      StoredStudent {
        id,
        name: name.to_string(),
        email: email.to_string(),
        is_active: false,
        class: class.map(str::to_string),
        section: section.map(str::to_string),
        roll: Some(id),
        reviewer_id: None,
        reviewed: false,
      },
    );
    id
  }

  pub fn get(&self, id: StudentId) -> Option<StoredStudent> {
    self.state.lock().students.get(&id).cloned()
  }

  pub fn len(&self) -> usize {
    self.state.lock().students.len()
  }

  /// Drops the row while the user lookup keeps reporting it.
  pub fn vanish_behind_lookup(&self, id: StudentId) {
    let mut state = self.state.lock();
    state.students.remove(&id);
    state.ghosts.insert(id);
  }

  pub fn reject_creates_with(&self, message: &str) {
    *self.reject_creates_with.lock() = Some(message.to_string());
  }

  pub fn make_status_match_nothing(&self) {
    self.status_matches_nothing.store(true, Ordering::SeqCst);
  }

  pub fn make_updates_fail(&self) {
    self.fail_updates.store(true, Ordering::SeqCst);
  }

  pub fn make_deletes_fail(&self) {
    self.fail_deletes.store(true, Ordering::SeqCst);
  }

  pub fn make_lookups_fail(&self) {
    self.fail_lookups.store(true, Ordering::SeqCst);
  }

  fn email_taken(state: &StoreState, email: &str, except: Option<StudentId>) -> bool {
    state
      .students
      .values()
      .any(|s| s.email.eq_ignore_ascii_case(email) && Some(s.id) != except)
  }
}

fn unique_violation() -> StoreError {
  StoreError::UniqueViolation {
    constraint: Some("users_email_key".to_string()),
  }
}

#[async_trait]
impl StudentStore for InMemoryStore {
  async fn search(&self, query: &StudentQuery) -> StoreResult<StudentPage> {
    self.calls.search.fetch_add(1, Ordering::SeqCst);
    let state = self.state.lock();
    let needle = query.search.to_lowercase();
    let matching: Vec<StudentSummary> = state
      .students
      .values()
      .filter(|s| {
        needle.is_empty() || s.name.to_lowercase().contains(&needle) || s.email.to_lowercase().contains(&needle)
      })
      .filter(|s| query.class.is_none() || s.class == query.class)
      .filter(|s| query.section.is_none() || s.section == query.section)
      .map(StoredStudent::summary)
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
    self.calls.create_or_update.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.reject_creates_with.lock().clone() {
      return Ok(UpsertOutcome::Rejected { message });
    }

    let mut state = self.state.lock();
    if Self::email_taken(&state, &payload.email, None) {
      return Err(unique_violation());
    }
    state.next_id += 1;
    let id = state.next_id;
    state.students.insert(
      id,
      StoredStudent {
        id,
        name: payload.name.clone(),
        email: payload.email.clone(),
        is_active: false,
        class: payload.class_name.clone(),
        section: payload.section_name.clone(),
        roll: payload.roll,
        reviewer_id: None,
        reviewed: false,
      },
    );
    Ok(UpsertOutcome::Saved {
      user_id: id,
      message: "Student added successfully".to_string(),
    })
  }

  async fn detail(&self, id: StudentId) -> StoreResult<Option<StudentDetail>> {
    self.calls.detail.fetch_add(1, Ordering::SeqCst);
    Ok(self.state.lock().students.get(&id).map(StoredStudent::detail))
  }

  async fn set_status(&self, change: &StatusChange) -> StoreResult<u64> {
    self.calls.set_status.fetch_add(1, Ordering::SeqCst);
    if self.status_matches_nothing.load(Ordering::SeqCst) {
      return Ok(0);
    }
    let mut state = self.state.lock();
    match state.students.get_mut(&change.user_id) {
      Some(student) => {
        student.is_active = change.is_active;
        student.reviewer_id = change.reviewer_id;
        student.reviewed = true;
        Ok(1)
      }
      None => Ok(0),
    }
  }

  async fn update_basic(&self, id: StudentId, name: Option<&str>, email: Option<&str>) -> StoreResult<UpdatedStudent> {
    self.calls.update_basic.fetch_add(1, Ordering::SeqCst);
    if self.fail_updates.load(Ordering::SeqCst) {
      return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
    }
    let mut state = self.state.lock();
    if let Some(email) = email {
      if Self::email_taken(&state, email, Some(id)) {
        return Err(unique_violation());
      }
    }
    let student = state.students.get_mut(&id).ok_or(StoreError::NotFound)?;
    if let Some(name) = name {
      student.name = name.to_string();
    }
    if let Some(email) = email {
      student.email = email.to_string();
    }
    Ok(UpdatedStudent {
      id,
      name: student.name.clone(),
      email: student.email.clone(),
    })
  }

  async fn delete(&self, id: StudentId) -> StoreResult<StudentId> {
    self.calls.delete.fetch_add(1, Ordering::SeqCst);
    if self.fail_deletes.load(Ordering::SeqCst) {
      return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
    }
    self
      .state
      .lock()
      .students
      .remove(&id)
      .map(|s| s.id)
      .ok_or(StoreError::NotFound)
  }
}

#[async_trait]
impl UserLookup for InMemoryStore {
  async fn find_by_id(&self, id: StudentId) -> StoreResult<Option<UserRecord>> {
    self.calls.find_by_id.fetch_add(1, Ordering::SeqCst);
    if self.fail_lookups.load(Ordering::SeqCst) {
      return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
    }
    let state = self.state.lock();
    if let Some(s) = state.students.get(&id) {
      return Ok(Some(UserRecord {
        id: s.id,
        name: s.name.clone(),
        email: s.email.clone(),
      }));
    }
    if state.ghosts.contains(&id) {
      return Ok(Some(UserRecord {
        id,
        name: "ghost".to_string(),
        email: "ghost@school.test".to_string(),
      }));
    }
    Ok(None)
  }
}

// --- Notifier fake ---
#[derive(Debug, Default)]
pub struct RecordingNotifier {
  failing: AtomicBool,
  pub sent: Mutex<Vec<VerificationRequest>>,
  pub attempts: AtomicUsize,
}

impl RecordingNotifier {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn failing() -> Arc<Self> {
    let notifier = Self::default();
    notifier.failing.store(true, Ordering::SeqCst);
    Arc::new(notifier)
  }
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send_verification_email(&self, request: VerificationRequest) -> Result<VerificationReceipt, NotifyError> {
    self.attempts.fetch_add(1, Ordering::SeqCst);
    if self.failing.load(Ordering::SeqCst) {
      return Err(NotifyError::Transport {
        source: anyhow::anyhow!("smtp relay unreachable"),
      });
    }
    let receipt = VerificationReceipt {
      message_id: format!("test-{}", request.user_id),
      verification_link: format!("https://school.test/verify?user={}", request.user_id),
    };
    self.sent.lock().push(request);
    Ok(receipt)
  }
}

// --- Builders ---
pub fn service_with(store: &Arc<InMemoryStore>, notifier: &Arc<RecordingNotifier>) -> StudentService {
  StudentService::new(store.clone(), store.clone(), notifier.clone()).expect("enrollment pipeline builds")
}

pub fn new_student(name: &str, email: &str) -> NewStudent {
  NewStudent {
    name: name.to_string(),
    email: email.to_string(),
    class_name: Some("7".to_string()),
    section_name: Some("A".to_string()),
    ..Default::default()
  }
}

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
