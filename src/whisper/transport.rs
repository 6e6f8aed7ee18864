use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single outbound platform message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The platform refused to deliver to this chat, typically because the
    /// user never started a private conversation with the bot
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,
}

/// Private delivery of revealed whisper content
#[async_trait]
pub trait PrivateMessenger: Send + Sync {
    async fn send_private_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
}

/// Destination for audit copies
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn notify(&self, operator_id: i64, text: &str) -> Result<(), TransportError>;
}
