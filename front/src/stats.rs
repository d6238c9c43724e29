//! Read-only projections over the loaded list, as shown on the dashboard.

use std::collections::BTreeMap;

use taskdesk_api::v1::{Todo, TodoStatus};

/// How many entries the "new" and "in progress" panels show.
pub const PANEL_LIMIT: usize = 10;

/// Count per status. All three statuses are always present.
pub fn counts_by_status(items: &[Todo]) -> BTreeMap<TodoStatus, usize> {
    let mut counts: BTreeMap<_, _> = TodoStatus::ALL.iter().map(|&s| (s, 0)).collect();

    for todo in items {
        *counts.entry(todo.status).or_default() += 1;
    }

    counts
}

pub fn favorites_of(items: &[Todo]) -> Vec<&Todo> {
    items.iter().filter(|todo| todo.is_favorite).collect()
}

/// Todos in `status`, in list order, at most `limit` of them.
pub fn with_status(items: &[Todo], status: TodoStatus, limit: usize) -> Vec<&Todo> {
    items
        .iter()
        .filter(|todo| todo.status == status)
        .take(limit)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slice {
    pub name: &'static str,
    pub value: usize,
}

/// Pie chart data: one slice per status, in display order, zeros included.
pub fn distribution(items: &[Todo]) -> Vec<Slice> {
    let counts = counts_by_status(items);

    TodoStatus::ALL
        .iter()
        .map(|status| Slice {
            name: status.label(),
            value: counts.get(status).copied().unwrap_or_default(),
        })
        .collect()
}
