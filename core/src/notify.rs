// roster/src/notify.rs

//! Account verification notifications.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::StudentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
  pub user_id: StudentId,
  pub user_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReceipt {
  pub message_id: String,
  pub verification_link: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("Recipient rejected: {0}")]
  Rejected(String),

  #[error("Notification transport failed: {source}")]
  Transport {
    #[source]
    source: anyhow::Error,
  },
}

/// Sends account verification emails. Callers treat failures as best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_verification_email(&self, request: VerificationRequest) -> Result<VerificationReceipt, NotifyError>;
}
