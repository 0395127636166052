use crate::channels::traits::{DispatchError, DispatchReceipt, Dispatcher, InboundMessage};
use async_trait::async_trait;
use std::time::Duration;

/// Graph API root for the WhatsApp Business Cloud API.
pub const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v18.0";

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// WhatsApp Business Cloud API dispatcher.
///
/// Inbound messages are webhook-driven (push); the gateway owns the webhook
/// routes and hands payloads to [`parse_webhook_payload`].
#[derive(Clone)]
pub struct WhatsAppDispatcher {
    access_token: String,
    phone_number_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppDispatcher {
    pub fn new(
        access_token: impl Into<String>,
        phone_number_id: impl Into<String>,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| DispatchError {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
                detail: None,
            })?;
        Ok(Self {
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
            base_url: GRAPH_BASE_URL.to_owned(),
            client,
        })
    }

    /// Point the dispatcher at a different Graph API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[async_trait]
impl Dispatcher for WhatsAppDispatcher {
    fn id(&self) -> &'static str {
        "whatsapp"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<DispatchReceipt, DispatchError> {
        let to = destination.trim();
        let to = to.strip_prefix('+').unwrap_or(to);
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": {
                "preview_url": false,
                "body": text
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError {
                status: None,
                message: format!("whatsapp request failed: {e}"),
                detail: None,
            })?;

        let status = response.status();
        let raw = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<serde_json::Value>(&raw).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|v| v.pointer("/error/message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("whatsapp send failed ({status})"));
            tracing::warn!(status = status.as_u16(), %message, "whatsapp rejected message");
            return Err(DispatchError {
                status: Some(status.as_u16()),
                message,
                detail: parsed,
            });
        }

        let message_id = parsed
            .as_ref()
            .and_then(|v| v.pointer("/messages/0/id"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        Ok(DispatchReceipt { message_id })
    }
}

/// Parse a WhatsApp webhook payload into inbound text messages.
///
/// Walks every `entry[].changes[].value.messages[]`; messages without a
/// sender or text body (status callbacks, media) are skipped.
#[must_use]
pub fn parse_webhook_payload(payload: &serde_json::Value) -> Vec<InboundMessage> {
    let mut inbound = Vec::new();
    let Some(entries) = payload.get("entry").and_then(serde_json::Value::as_array) else {
        return inbound;
    };

    for entry in entries {
        let Some(changes) = entry.get("changes").and_then(serde_json::Value::as_array) else {
            continue;
        };

        for change in changes {
            let Some(messages) = change
                .pointer("/value/messages")
                .and_then(serde_json::Value::as_array)
            else {
                continue;
            };

            for msg in messages {
                let from = msg
                    .get("from")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .trim();
                if from.is_empty() {
                    continue;
                }

                let Some(body) = msg
                    .get("text")
                    .and_then(|v| v.get("body"))
                    .and_then(serde_json::Value::as_str)
                else {
                    continue;
                };

                inbound.push(InboundMessage {
                    sender: from.to_owned(),
                    text: body.trim().to_lowercase(),
                });
            }
        }
    }

    inbound
}
