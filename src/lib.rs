//! daybrief: calendar digests delivered over WhatsApp.
//!
//! The service wraps the `daybrief-agenda` aggregation core with everything
//! needed to run it:
//!
//! - **Profiles**: who to send to, with which credential, in which timezone
//! - **Router**: turns a direct trigger or inbound chat message into a digest
//! - **Channels**: the WhatsApp dispatcher and the axum webhook gateway
//! - **Scheduler**: daily and weekly digests at each user's local time
//!
//! Failures are request-scoped. An expired calendar login is reported to the
//! user as such and never rendered as an empty schedule.

pub mod channels;
pub mod config;
pub mod error;
pub mod logging;
pub mod profiles;
pub mod router;
pub mod scheduler;

pub use config::AppConfig;
pub use error::{DigestError, Result};
pub use profiles::{Profile, ProfileStore, SqliteProfileStore};
pub use router::{Action, Outcome, RequestRouter, Trigger};
pub use scheduler::DigestScheduler;
