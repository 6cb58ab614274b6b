// roster_server/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::student_handlers;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .app_data(web::JsonConfig::default().error_handler(json_error_handler))
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/students")
          .route("", web::get().to(student_handlers::list_students_handler))
          .route("", web::post().to(student_handlers::create_student_handler))
          .route("/{id}", web::get().to(student_handlers::get_student_handler))
          .route("/{id}", web::put().to(student_handlers::update_student_handler))
          .route("/{id}", web::delete().to(student_handlers::delete_student_handler))
          .route("/{id}/status", web::patch().to(student_handlers::set_student_status_handler)),
      ),
  );
}
