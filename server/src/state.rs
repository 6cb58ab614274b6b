// roster_server/src/state.rs
use roster::StudentService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub students: Arc<StudentService>,
}
