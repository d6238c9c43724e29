use taskdesk_api::v1::{Todo, TodoStatus};

pub fn status_badge(status: TodoStatus) -> String {
    format!("[{}]", status.label())
}

pub fn date_label(todo: &Todo) -> String {
    match todo.created_on() {
        Some(day) => day.format("%b %-d, %Y").to_string(),
        None => String::from("Date not available"),
    }
}

/// One line per todo: favorite marker, id, icon, title, status and date,
/// with the description indented below when there is one.
pub fn row(todo: &Todo) -> String {
    let star = if todo.is_favorite { "★" } else { "☆" };
    let id = todo.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
    let icon = todo.icon.as_deref().unwrap_or("•");

    let mut line = format!(
        "{star} #{id} {icon} {} {} ({})",
        todo.title,
        status_badge(todo.status),
        date_label(todo)
    );

    if !todo.description().is_empty() {
        line.push_str("\n      ");
        line.push_str(todo.description());
    }

    line
}

/// Short form used in dashboard panels.
pub fn compact(index: usize, todo: &Todo) -> String {
    format!("{:>2}. {}", index + 1, todo.title)
}
