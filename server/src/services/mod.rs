// roster_server/src/services/mod.rs

//! Outbound collaborators the core consumes through its traits.

pub mod mailer;

pub use mailer::MockMailer;
