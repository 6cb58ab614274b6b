// roster_server/src/services/mailer.rs
use async_trait::async_trait;
use roster::{Notifier, NotifyError, VerificationReceipt, VerificationRequest};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Logs verification emails instead of delivering them.
///
/// Recipients on the reserved `.invalid` TLD are refused, which is how the
/// degraded create path can be exercised against a running server.
#[derive(Debug, Clone)]
pub struct MockMailer {
  sender: String,
  app_base_url: String,
}

impl MockMailer {
  pub fn new(sender: impl Into<String>, app_base_url: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
    }
  }

  fn verification_link(&self, token: &Uuid) -> String {
    format!("{}/api/v1/auth/verify?token={}", self.app_base_url, token)
  }
}

#[async_trait]
impl Notifier for MockMailer {
  #[instrument(name = "mailer::send_verification_email", skip(self, request), fields(user_id = request.user_id), err(Display))]
  async fn send_verification_email(&self, request: VerificationRequest) -> Result<VerificationReceipt, NotifyError> {
    info!(
      "Simulating verification email: To='{}', From='{}'",
      request.user_email, self.sender
    );
    tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

    if request.user_email.to_ascii_lowercase().ends_with(".invalid") {
      warn!("Refusing verification email to reserved domain: {}", request.user_email);
      return Err(NotifyError::Rejected(request.user_email));
    }

    let token = Uuid::new_v4();
    let verification_link = self.verification_link(&token);
    let message_id = format!("mock_email_{}", Uuid::new_v4());
    info!("Mock verification email sent. Message ID: {}", message_id);

    Ok(VerificationReceipt {
      message_id,
      verification_link,
    })
  }
}
