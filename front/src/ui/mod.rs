pub mod todo;

use taskdesk_api::v1::{Todo, TodoStatus, User};

use crate::{
    filter::FilterCriteria,
    stats::{self, PANEL_LIMIT},
};

const BAR_WIDTH: usize = 30;

pub fn user(user: &User) -> String {
    format!(
        "{} <{}>",
        user.username.as_deref().unwrap_or("User"),
        user.email.as_deref().unwrap_or("email")
    )
}

/// The "All Items" view.
pub fn list(items: &[Todo], criteria: &FilterCriteria) -> String {
    let mut lines = vec![String::from("All Items")];

    if !criteria.is_empty() {
        lines.push(filters(criteria));
    }

    if items.is_empty() {
        lines.push(String::from("No items found."));
    }

    lines.extend(items.iter().map(todo::row));
    lines.join("\n")
}

fn filters(criteria: &FilterCriteria) -> String {
    let mut parts = Vec::new();

    if !criteria.keyword.trim().is_empty() {
        parts.push(format!("search \"{}\"", criteria.keyword.trim()));
    }

    if let Some(status) = criteria.status {
        parts.push(format!("status {}", status.label()));
    }

    if let Some(date) = criteria.date {
        parts.push(format!("date {date}"));
    }

    if criteria.only_favorites {
        parts.push(String::from("favorites only"));
    }

    format!("Filtered by {}", parts.join(", "))
}

pub fn dashboard(user: &User, items: &[Todo]) -> String {
    let counts = stats::counts_by_status(items);
    let mut lines = vec![format!("Dashboard for {}", self::user(user)), String::new()];

    for status in TodoStatus::ALL {
        lines.push(format!(
            "{:<12} {}",
            status.label(),
            counts.get(&status).copied().unwrap_or_default()
        ));
    }

    lines.push(String::new());
    lines.push(String::from("Favorites"));
    let favorites = stats::favorites_of(items);
    if favorites.is_empty() {
        lines.push(String::from("  No favorite items yet."));
    }
    lines.extend(
        favorites
            .iter()
            .map(|todo| format!("  ★ {} {}", todo.title, todo::status_badge(todo.status))),
    );

    lines.push(String::new());
    lines.extend(distribution(items));

    for (title, status) in [
        ("New Items", TodoStatus::New),
        ("In Progress", TodoStatus::InProgress),
    ] {
        lines.push(String::new());
        lines.push(String::from(title));

        let panel = stats::with_status(items, status, PANEL_LIMIT);
        if panel.is_empty() {
            lines.push(String::from("  Nothing here."));
        }
        lines.extend(
            panel
                .iter()
                .enumerate()
                .map(|(index, todo)| format!("  {}", todo::compact(index, todo))),
        );
    }

    lines.join("\n")
}

fn distribution(items: &[Todo]) -> Vec<String> {
    let slices = stats::distribution(items);
    let total: usize = slices.iter().map(|slice| slice.value).sum();

    let mut lines = vec![format!("Todo Distribution (total {total})")];
    lines.extend(slices.iter().map(|slice| {
        let width = match total {
            0 => 0,
            total => slice.value * BAR_WIDTH / total,
        };
        format!("  {:<12} {:>3} {}", slice.name, slice.value, "█".repeat(width))
    }));

    lines
}
