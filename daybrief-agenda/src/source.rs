//! Trait definition for pluggable schedule sources.
//!
//! A source (calendar provider, task provider) exposes its containers and the
//! items inside one container. Fan-out across containers and failure
//! containment live in [`crate::aggregate`], so implementors only deal with a
//! single request at a time.

use crate::error::AgendaError;
use crate::types::{Container, SourceKind, UnifiedItem};
use crate::window::Window;

/// A provider of calendar events or tasks.
///
/// All implementations must be `Send + Sync` so containers can be fetched
/// concurrently.
pub trait ScheduleSource: Send + Sync {
    /// Enumerate every container (calendar or task list) for the account.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Auth`] when the credential is rejected, or
    /// another [`AgendaError`] when the listing fails.
    fn list_containers(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Container>, AgendaError>> + Send;

    /// Fetch the items of one container that fall inside the fetch range of
    /// `window`, in provider order.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError`] if the request or response mapping fails.
    fn list_items(
        &self,
        credential: &str,
        container: &Container,
        window: &Window,
    ) -> impl std::future::Future<Output = Result<Vec<UnifiedItem>, AgendaError>> + Send;

    /// Which source this is, for logging.
    fn kind(&self) -> SourceKind;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    struct FixedSource {
        items: Vec<UnifiedItem>,
    }

    impl ScheduleSource for FixedSource {
        async fn list_containers(&self, _credential: &str) -> Result<Vec<Container>, AgendaError> {
            Ok(vec![Container {
                id: "primary".into(),
                name: "Primary".into(),
            }])
        }

        async fn list_items(
            &self,
            _credential: &str,
            _container: &Container,
            _window: &Window,
        ) -> Result<Vec<UnifiedItem>, AgendaError> {
            Ok(self.items.clone())
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Calendar
        }
    }

    #[test]
    fn fixed_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FixedSource>();
    }

    #[tokio::test]
    async fn fixed_source_returns_items() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).single().expect("valid");
        let source = FixedSource {
            items: vec![UnifiedItem::event("workout", start, None, false)],
        };
        let window = Window::for_mode(Mode::Daily, start, Tz::UTC);
        let containers = source.list_containers("token").await.expect("containers");
        let items = source
            .list_items("token", &containers[0], &window)
            .await
            .expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(source.kind(), SourceKind::Calendar);
    }
}
