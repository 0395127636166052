use async_trait::async_trait;

/// Inbound message received from a messaging provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    /// Lower-cased, trimmed message body.
    pub text: String,
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub message_id: Option<String>,
}

/// The provider refused, or could not be reached for, a send.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DispatchError {
    /// HTTP status, when the provider answered.
    pub status: Option<u16>,
    pub message: String,
    /// Provider error body, when it was JSON.
    pub detail: Option<serde_json::Value>,
}

/// Outbound delivery contract. New providers only need to implement this
/// trait.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Stable provider identifier (e.g. `whatsapp`).
    fn id(&self) -> &'static str;

    /// Send `text` to `destination`.
    async fn send(&self, destination: &str, text: &str) -> Result<DispatchReceipt, DispatchError>;
}
