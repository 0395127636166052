//! Merge and clip: the deterministic ordering rules.

use crate::types::UnifiedItem;
use crate::window::Window;

/// Concatenate events then tasks and sort ascending by `start`.
///
/// The sort is stable: at equal instants events precede tasks, and each
/// source keeps its own relative order.
pub fn merge(events: Vec<UnifiedItem>, tasks: Vec<UnifiedItem>) -> Vec<UnifiedItem> {
    let mut merged = events;
    merged.extend(tasks);
    merged.sort_by_key(|item| item.start);
    merged
}

/// Keep only items whose `start` lies inside the display range.
pub fn clip(items: Vec<UnifiedItem>, window: &Window) -> Vec<UnifiedItem> {
    items
        .into_iter()
        .filter(|item| window.displays(item.start))
        .collect()
}
