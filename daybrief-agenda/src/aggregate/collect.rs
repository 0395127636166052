//! Per-source collection with container-level failure containment.

use crate::error::AgendaError;
use crate::source::ScheduleSource;
use crate::types::UnifiedItem;
use crate::window::Window;
use std::time::Duration;

/// Enumerate the containers of `source` and fetch each one concurrently.
///
/// A container that fails or exceeds `container_timeout` is logged and
/// contributes nothing; its siblings are unaffected. Items are returned in
/// container-enumeration order, each container's items in provider order.
///
/// # Errors
///
/// Only a failure of the container listing itself is returned.
pub async fn collect_source<S: ScheduleSource>(
    source: &S,
    credential: &str,
    window: &Window,
    container_timeout: Duration,
) -> Result<Vec<UnifiedItem>, AgendaError> {
    let kind = source.kind();
    let containers = source.list_containers(credential).await?;

    let fetches = containers.iter().map(|container| async move {
        let outcome =
            match tokio::time::timeout(container_timeout, source.list_items(credential, container, window))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AgendaError::Timeout(format!(
                    "{kind} container {} after {}s",
                    container.id,
                    container_timeout.as_secs()
                ))),
            };
        (container, outcome)
    });

    let outcomes = futures::future::join_all(fetches).await;

    let mut items = Vec::new();
    let mut failed: usize = 0;
    for (container, outcome) in outcomes {
        match outcome {
            Ok(found) => {
                tracing::debug!(%kind, container = %container.id, count = found.len(), "container fetched");
                items.extend(found);
            }
            Err(err) => {
                failed = failed.saturating_add(1);
                tracing::warn!(%kind, container = %container.id, error = %err, "container fetch failed, skipping");
            }
        }
    }

    tracing::debug!(%kind, containers = containers.len(), failed, items = items.len(), "source collected");
    Ok(items)
}
