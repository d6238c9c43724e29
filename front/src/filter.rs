use std::str::FromStr;

use chrono::NaiveDate;
use taskdesk_api::v1::{Todo, TodoStatus, UnknownStatus};

/// What the list view is narrowed to. Lives only as long as the view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub keyword: String,
    pub status: Option<TodoStatus>,
    pub only_favorites: bool,
    pub date: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.keyword.trim().is_empty()
            && self.status.is_none()
            && !self.only_favorites
            && self.date.is_none()
    }

    pub fn matches(&self, todo: &Todo) -> bool {
        if self.status.is_some_and(|status| todo.status != status) {
            return false;
        }

        if let Some(date) = self.date {
            if todo.created_on() != Some(date) {
                return false;
            }
        }

        let keyword = self.keyword.trim().to_lowercase();
        if !keyword.is_empty()
            && !todo.title.to_lowercase().contains(&keyword)
            && !todo.description().to_lowercase().contains(&keyword)
        {
            return false;
        }

        !self.only_favorites || todo.is_favorite
    }
}

/// Status choice of the filter bar, where "" and "all" mean any status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusFilter(pub Option<TodoStatus>);

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(StatusFilter(None)),
            any if any.eq_ignore_ascii_case("all") => Ok(StatusFilter(None)),
            status => status.parse().map(|status| StatusFilter(Some(status))),
        }
    }
}

/// Keeps the todos matching every criterion, favorites first. Relative order
/// is otherwise preserved, so applying twice gives the same list.
pub fn apply(items: &[Todo], criteria: &FilterCriteria) -> Vec<Todo> {
    let mut filtered: Vec<_> = items
        .iter()
        .filter(|todo| criteria.matches(todo))
        .cloned()
        .collect();

    favorites_first(&mut filtered);
    filtered
}

pub fn favorites_first(items: &mut [Todo]) {
    // stable, ties keep their order
    items.sort_by_key(|todo| !todo.is_favorite);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn todo(title: &str, status: TodoStatus, is_favorite: bool) -> Todo {
        Todo {
            title: title.to_string(),
            status,
            is_favorite,
            ..Todo::default()
        }
    }

    fn titles(items: &[Todo]) -> Vec<&str> {
        items.iter().map(|todo| todo.title.as_str()).collect()
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo("Buy milk", TodoStatus::New, false),
            todo("Pay rent", TodoStatus::Completed, true),
            todo("Call mom", TodoStatus::InProgress, false),
            todo("Water plants", TodoStatus::New, true),
        ]
    }

    #[test]
    fn empty_criteria_only_sorts_favorites_first() {
        let filtered = apply(&sample(), &FilterCriteria::default());

        assert_eq!(
            titles(&filtered),
            ["Pay rent", "Water plants", "Buy milk", "Call mom"]
        );
    }

    #[test]
    fn only_favorites() {
        let items = vec![
            todo("Buy milk", TodoStatus::New, false),
            todo("Pay rent", TodoStatus::Completed, true),
        ];
        let criteria = FilterCriteria {
            only_favorites: true,
            ..FilterCriteria::default()
        };

        assert_eq!(titles(&apply(&items, &criteria)), ["Pay rent"]);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let criteria = FilterCriteria {
            only_favorites: true,
            keyword: "a".into(),
            ..FilterCriteria::default()
        };

        let once = apply(&sample(), &criteria);
        let twice = apply(&once, &criteria);

        assert_eq!(once, twice);
    }

    #[test]
    fn status_filter_is_exact() {
        let criteria = FilterCriteria {
            status: Some(TodoStatus::New),
            ..FilterCriteria::default()
        };

        assert_eq!(
            titles(&apply(&sample(), &criteria)),
            ["Water plants", "Buy milk"]
        );
    }

    #[test]
    fn keyword_matches_title_or_description_ignoring_case() {
        let mut items = sample();
        items[2].description = Some("Ask about the WEEKEND".into());

        let criteria = FilterCriteria {
            keyword: "  weekend ".into(),
            ..FilterCriteria::default()
        };
        assert_eq!(titles(&apply(&items, &criteria)), ["Call mom"]);

        let criteria = FilterCriteria {
            keyword: "MILK".into(),
            ..FilterCriteria::default()
        };
        assert_eq!(titles(&apply(&items, &criteria)), ["Buy milk"]);
    }

    #[test]
    fn date_filter_skips_missing_and_garbage_dates() {
        let mut items = sample();
        items[0].created_at = Some("2024-05-01T08:30:00Z".into());
        items[1].created_at = Some("not a date".into());
        items[2].created_at = Some("2024-05-02".into());

        let criteria = FilterCriteria {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..FilterCriteria::default()
        };

        assert_eq!(titles(&apply(&items, &criteria)), ["Buy milk"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let mut items = sample();
        items[3].created_at = Some("2024-05-01".into());
        items[0].created_at = Some("2024-05-01".into());

        let criteria = FilterCriteria {
            keyword: "a".into(),
            status: Some(TodoStatus::New),
            only_favorites: true,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
        };

        assert_eq!(titles(&apply(&items, &criteria)), ["Water plants"]);
    }

    #[test]
    fn status_filter_parses_any() {
        assert_eq!("".parse::<StatusFilter>(), Ok(StatusFilter(None)));
        assert_eq!("All".parse::<StatusFilter>(), Ok(StatusFilter(None)));
        assert_eq!(
            "in_progress".parse::<StatusFilter>(),
            Ok(StatusFilter(Some(TodoStatus::InProgress)))
        );
        assert!("later".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn apply_leaves_input_alone() {
        let items = sample();
        let before = items.clone();

        let _ = apply(&items, &FilterCriteria::default());

        assert_eq!(items, before);
    }
}
