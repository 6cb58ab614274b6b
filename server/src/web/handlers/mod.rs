// roster_server/src/web/handlers/mod.rs

pub mod student_handlers;
