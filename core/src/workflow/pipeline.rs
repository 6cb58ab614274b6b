// roster/src/workflow/pipeline.rs

//! `Pipeline<TData, Err>` definition, handler registration and execution.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, error, info_span, warn, Instrument};

use super::context::{ContextData, Handler, PipelineControl};
use super::WorkflowError;

/// Name and optionality of one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

/// Outcome of a full pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub result: PipelineResult,
  /// Optional steps whose handlers failed, in execution order.
  pub failed_optional_steps: Vec<String>,
}

impl RunSummary {
  pub fn step_failed(&self, step_name: &str) -> bool {
    self.failed_optional_steps.iter().any(|s| s == step_name)
  }
}

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  steps: Vec<StepDef>,
  handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional)` pairs.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
      })
      .collect();

    Self {
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  /// Registers a handler for `step_name`. Handlers of one step run in
  /// registration order.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> Result<&mut Self, WorkflowError>
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    if !self.steps.iter().any(|s| s.name == step_name) {
      return Err(WorkflowError::UnknownStep {
        step_name: step_name.to_string(),
      });
    }

    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
    Ok(self)
  }

  /// Executes every step against `ctx_data`.
  ///
  /// A failing required step returns its error. A failing optional step is
  /// logged, its remaining handlers are skipped, and the run continues.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<RunSummary, Err> {
    debug!(num_steps = self.steps.len(), "Pipeline execution starting.");
    let mut failed_optional_steps = Vec::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          debug!(step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        _ => {
          error!(step_name, "Non-optional step has no handlers.");
          return Err(Err::from(WorkflowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      let step_span = info_span!(
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      for handler_fn in handlers {
        match handler_fn(ctx_data.clone()).instrument(step_span.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            debug!(step_name, "Pipeline stopped by handler.");
            return Ok(RunSummary {
              result: PipelineResult::Stopped,
              failed_optional_steps,
            });
          }
          Err(e) if step_def.optional => {
            warn!(step_name, error = %e, "Optional step failed, continuing.");
            failed_optional_steps.push(step_def.name.clone());
            break;
          }
          Err(e) => {
            error!(step_name, error = %e, "Step failed.");
            return Err(e);
          }
        }
      }
    }

    debug!("Pipeline execution completed.");
    Ok(RunSummary {
      result: PipelineResult::Completed,
      failed_optional_steps,
    })
  }
}
