//! Request routing: turn a trigger into a delivered message.
//!
//! A trigger is either a direct invocation from a trusted caller
//! (`{action, user_id}`) or an inbound chat message. Each request resolves a
//! profile and a destination, runs the aggregator and formatter when a digest
//! is asked for, and hands the text to the [`Dispatcher`]. Nothing is kept
//! between requests.

use crate::channels::traits::{Dispatcher, InboundMessage};
use crate::error::{DigestError, Result};
use crate::profiles::{Profile, ProfileStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use daybrief_agenda::{AgendaError, Aggregator, Mode, ScheduleSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Instrument;

pub const WELCOME_MESSAGE: &str = "👋 Welcome to daybrief! Every morning you'll get your schedule for the day ahead, and on Saturday evening an overview of the coming week. Reply *daily* or *weekly* at any time.";
pub const TEST_MESSAGE: &str =
    "✅ This is a test message from daybrief. Your WhatsApp number is connected.";
pub const HELP_MESSAGE: &str = "I received your message! Reply *daily* for the next 24 hours or *weekly* for the week ahead.";

/// What a direct trigger asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Welcome,
    Test,
    Daily,
    Weekly,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Test => "test",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Digest mode, for the actions that produce one.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Daily => Some(Mode::Daily),
            Self::Weekly => Some(Mode::Weekly),
            Self::Welcome | Self::Test => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "welcome" => Ok(Self::Welcome),
            "test" => Ok(Self::Test),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

impl From<Mode> for Action {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Daily => Self::Daily,
            Mode::Weekly => Self::Weekly,
        }
    }
}

/// How a request entered the system.
#[derive(Debug, Clone)]
pub enum Trigger {
    Direct { action: Action, user_id: String },
    Inbound(InboundMessage),
}

impl Trigger {
    fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Inbound(_) => "inbound",
        }
    }
}

/// A successfully delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// `welcome`, `test`, `daily`, `weekly` or `help`.
    pub action: String,
    pub destination: String,
    /// [`Dispatcher::id`] of the provider that carried the message.
    pub channel: &'static str,
    pub message_id: Option<String>,
}

/// Result of a request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered(Delivery),
    /// Inbound sender matched no profile. `replied` says whether the
    /// best-effort explanation reached them.
    UnknownSender { sender: String, replied: bool },
}

impl Outcome {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Delivered(delivery) => serde_json::json!({
                "ok": true,
                "action": delivery.action,
                "destination": delivery.destination,
                "channel": delivery.channel,
                "message_id": delivery.message_id,
            }),
            Self::UnknownSender { sender, replied } => serde_json::json!({
                "ok": true,
                "outcome": "profile_not_found",
                "sender": sender,
                "replied": replied,
            }),
        }
    }
}

/// Structured error body for a failed request.
pub fn error_json(err: &DigestError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "ok": false,
        "error": err.category(),
        "message": err.user_message(),
    });
    if let (Some(detail), Some(map)) = (err.detail(), body.as_object_mut()) {
        map.insert("detail".to_owned(), detail.clone());
    }
    body
}

/// Produces the rendered digest text for one credential.
#[async_trait]
pub trait Agenda: Send + Sync {
    async fn digest(
        &self,
        credential: &str,
        mode: Mode,
        now: DateTime<Utc>,
        zone: Tz,
    ) -> std::result::Result<String, AgendaError>;
}

#[async_trait]
impl<C, T> Agenda for Aggregator<C, T>
where
    C: ScheduleSource + 'static,
    T: ScheduleSource + 'static,
{
    async fn digest(
        &self,
        credential: &str,
        mode: Mode,
        now: DateTime<Utc>,
        zone: Tz,
    ) -> std::result::Result<String, AgendaError> {
        daybrief_agenda::digest(self, credential, mode, now, zone).await
    }
}

/// Routes triggers to the aggregator and dispatcher.
#[derive(Clone)]
pub struct RequestRouter {
    profiles: Arc<dyn ProfileStore>,
    agenda: Arc<dyn Agenda>,
    dispatcher: Arc<dyn Dispatcher>,
    default_zone: Tz,
}

impl RequestRouter {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        agenda: Arc<dyn Agenda>,
        dispatcher: Arc<dyn Dispatcher>,
        default_zone: Tz,
    ) -> Self {
        Self {
            profiles,
            agenda,
            dispatcher,
            default_zone,
        }
    }

    /// Run a profile store query on the blocking pool.
    pub(crate) async fn lookup<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&dyn ProfileStore) -> std::result::Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.profiles);
        tokio::task::spawn_blocking(move || query(store.as_ref()))
            .await
            .map_err(|e| DigestError::Store(format!("profile lookup task failed: {e}")))?
            .map_err(|e| DigestError::Store(e.to_string()))
    }

    /// Handle one trigger as seen at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`DigestError`] whose category tells the caller what went
    /// wrong. User-facing failures are also sent to the user when a
    /// destination is known.
    pub async fn handle(&self, trigger: Trigger, now: DateTime<Utc>) -> Result<Outcome> {
        let span = tracing::info_span!(
            "digest_request",
            request_id = %uuid::Uuid::new_v4(),
            trigger = trigger.kind(),
            channel = self.dispatcher.id(),
        );
        async move {
            let result = match trigger {
                Trigger::Direct { action, user_id } => {
                    self.handle_direct(action, &user_id, now).await
                }
                Trigger::Inbound(message) => self.handle_inbound(message, now).await,
            };
            match &result {
                Ok(outcome) => tracing::info!(?outcome, "request handled"),
                Err(err) => {
                    tracing::warn!(category = err.category(), error = %err, "request failed")
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn handle_direct(
        &self,
        action: Action,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let owned_id = user_id.to_owned();
        let profile = self
            .lookup(move |store| store.by_user_id(&owned_id))
            .await?
            .ok_or_else(|| DigestError::ProfileNotFound(user_id.to_owned()))?;
        let destination = profile
            .destination()
            .ok_or_else(|| DigestError::DestinationNotSet(profile.user_id.clone()))?
            .to_owned();

        match action.mode() {
            None => {
                let text = match action {
                    Action::Welcome => WELCOME_MESSAGE,
                    _ => TEST_MESSAGE,
                };
                self.deliver(action.name(), &destination, text).await
            }
            Some(mode) => self.run_digest(&profile, &destination, mode, now).await,
        }
    }

    async fn handle_inbound(&self, message: InboundMessage, now: DateTime<Utc>) -> Result<Outcome> {
        let sender = message.sender;
        let address = sender.clone();
        let profile = self
            .lookup(move |store| store.by_destination(&address))
            .await?;

        let Some(profile) = profile else {
            let reply = DigestError::ProfileNotFound(sender.clone());
            let replied = self.notify(&sender, &reply).await;
            return Ok(Outcome::UnknownSender { sender, replied });
        };

        match message.text.parse::<Mode>() {
            Ok(mode) => self.run_digest(&profile, &sender, mode, now).await,
            Err(_) => {
                tracing::debug!(user_id = %profile.user_id, "unrecognised command, sending help");
                self.deliver("help", &sender, HELP_MESSAGE).await
            }
        }
    }

    async fn run_digest(
        &self,
        profile: &Profile,
        destination: &str,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let Some(credential) = profile.credential() else {
            let err = DigestError::CredentialMissing(profile.user_id.clone());
            self.notify(destination, &err).await;
            return Err(err);
        };

        let zone = profile.zone(self.default_zone);
        let text = match self.agenda.digest(credential, mode, now, zone).await {
            Ok(text) => text,
            Err(err) if err.is_auth() => {
                let err = DigestError::AuthExpired(err.to_string());
                self.notify(destination, &err).await;
                return Err(err);
            }
            Err(err) => return Err(DigestError::Agenda(err.to_string())),
        };

        self.deliver(Action::from(mode).name(), destination, &text)
            .await
    }

    async fn deliver(&self, action: &str, destination: &str, text: &str) -> Result<Outcome> {
        let receipt = self.dispatcher.send(destination, text).await?;
        Ok(Outcome::Delivered(Delivery {
            action: action.to_owned(),
            destination: destination.to_owned(),
            channel: self.dispatcher.id(),
            message_id: receipt.message_id,
        }))
    }

    /// Best-effort explanation of `err` to the user.
    async fn notify(&self, destination: &str, err: &DigestError) -> bool {
        match self.dispatcher.send(destination, err.user_message()).await {
            Ok(_) => true,
            Err(send_err) => {
                tracing::warn!(error = %send_err, category = err.category(), "failed to notify user");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("Welcome".parse::<Action>().unwrap(), Action::Welcome);
        assert_eq!(" WEEKLY ".parse::<Action>().unwrap(), Action::Weekly);
        assert!("summary".parse::<Action>().is_err());
    }

    #[test]
    fn only_digest_actions_have_a_mode() {
        assert_eq!(Action::Daily.mode(), Some(Mode::Daily));
        assert_eq!(Action::Weekly.mode(), Some(Mode::Weekly));
        assert_eq!(Action::Welcome.mode(), None);
        assert_eq!(Action::Test.mode(), None);
    }

    #[test]
    fn action_deserializes_lowercase() {
        let action: Action = serde_json::from_str("\"test\"").unwrap();
        assert_eq!(action, Action::Test);
    }

    #[test]
    fn error_json_includes_detail_only_when_present() {
        let plain = error_json(&DigestError::AuthExpired("401".into()));
        assert_eq!(plain["ok"], false);
        assert_eq!(plain["error"], "auth_expired");
        assert!(plain.get("detail").is_none());

        let rejected = error_json(&DigestError::DispatchRejected(
            crate::channels::traits::DispatchError {
                status: Some(400),
                message: "invalid recipient".into(),
                detail: Some(serde_json::json!({"error": {"code": 131030}})),
            },
        ));
        assert_eq!(rejected["error"], "dispatch_rejected");
        assert_eq!(rejected["detail"]["error"]["code"], 131030);
    }

    #[test]
    fn delivered_outcome_json_shape() {
        let outcome = Outcome::Delivered(Delivery {
            action: "daily".into(),
            destination: "15551234567".into(),
            channel: "whatsapp",
            message_id: Some("wamid.1".into()),
        });
        let json = outcome.to_json();
        assert_eq!(json["ok"], true);
        assert_eq!(json["action"], "daily");
        assert_eq!(json["channel"], "whatsapp");
        assert_eq!(json["message_id"], "wamid.1");
    }
}
