//! Outbound mail abstractions

use crate::core::error::RateResult;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submits one message. Success means accepted, not delivered.
    async fn send(&self, message: &MailMessage) -> RateResult<()>;
}
