// roster/src/workflow/mod.rs

//! A small named-step pipeline used to sequence multi-stage operations.
//!
//! Steps run in declaration order against a shared [`ContextData`]. A required
//! step that fails aborts the run; an optional step that fails is logged and
//! recorded in the [`RunSummary`], and the run carries on.

pub mod context;
pub mod pipeline;

pub use context::{ContextData, Handler, PipelineControl};
pub use pipeline::{Pipeline, PipelineResult, RunSummary, StepDef};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("Step not found: {step_name}")]
  UnknownStep { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}
