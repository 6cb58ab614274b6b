// roster_server/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod services;
mod state;
mod web;

#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::services::MockMailer;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use roster::{PgStudentStore, StudentService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const STUDENT_ROLE_NAME: &str = "student";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // RUST_LOG overrides the default level.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting student roster server...");

  let app_config = AppConfig::from_env().context("Failed to load application configuration")?;
  let app_state = bootstrap(&app_config).await?;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .configure(web::configure_app_routes)
      .wrap(tracing_actix_web::TracingLogger::default())
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("Server terminated with an error")
}

/// Connects the pool, resolves the student role and wires the service.
async fn bootstrap(app_config: &AppConfig) -> anyhow::Result<AppState> {
  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await
    .context("Failed to connect to the database")?;
  tracing::info!("Successfully connected to the database.");

  let student_role_id = match app_config.student_role_id {
    Some(id) => id,
    None => PgStudentStore::resolve_role_id(&db_pool, STUDENT_ROLE_NAME)
      .await
      .with_context(|| format!("No usable role named '{}'; set STUDENT_ROLE_ID", STUDENT_ROLE_NAME))?,
  };
  tracing::info!(student_role_id, "Student role resolved.");

  let store = Arc::new(PgStudentStore::new(db_pool, student_role_id));
  let mailer = Arc::new(MockMailer::new(
    app_config.mail_sender.clone(),
    app_config.app_base_url.clone(),
  ));
  let students = StudentService::new(store.clone(), store, mailer).context("Failed to build student service")?;

  Ok(AppState {
    students: Arc::new(students),
  })
}
