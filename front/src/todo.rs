use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{Local, NaiveDate};
use taskdesk_api::v1::{Id, Todo, TodoPayload, TodoStatus};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiClient, ApiError},
    error::{Result, TodoError},
    filter::{self, FilterCriteria},
    notify::Notifier,
};

pub const TITLE_REQUIRED: &str = "Todo title is required";
pub const TITLE_EXISTS: &str = "Todo title already exists";
pub const INVALID_ID: &str = "Invalid todo ID";
pub const PAST_DATE_NEW: &str = "For past dates, please set status to In Progress or Completed.";

/// The add/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub id: Option<Id>,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub icon: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Prefills the form for editing, with the date normalized to a day.
    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
            description: todo.description().to_string(),
            status: todo.status,
            icon: todo.icon.clone(),
            date: todo.created_on(),
        }
    }

    pub fn is_past_date(&self, today: NaiveDate) -> bool {
        self.date.is_some_and(|date| date < today)
    }

    fn duplicates(&self, todo: &Todo) -> bool {
        todo.title.trim().to_lowercase() == self.title.trim().to_lowercase()
    }

    pub fn validate_for_create(&self, existing: &[Todo], today: NaiveDate) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TodoError::validation(TITLE_REQUIRED));
        }

        if existing.iter().any(|todo| self.duplicates(todo)) {
            return Err(TodoError::validation(TITLE_EXISTS));
        }

        self.validate_date(today)
    }

    /// Same rules as create, except that the todo being edited never counts
    /// as its own duplicate.
    pub fn validate_for_update(&self, existing: &[Todo], today: NaiveDate) -> Result<Id> {
        if self.title.trim().is_empty() {
            return Err(TodoError::validation(TITLE_REQUIRED));
        }

        let Some(id) = &self.id else {
            return Err(TodoError::validation(INVALID_ID));
        };

        if existing
            .iter()
            .any(|todo| todo.id.as_ref() != Some(id) && self.duplicates(todo))
        {
            return Err(TodoError::validation(TITLE_EXISTS));
        }

        self.validate_date(today)?;

        Ok(id.clone())
    }

    fn validate_date(&self, today: NaiveDate) -> Result<()> {
        if self.is_past_date(today) && self.status == TodoStatus::New {
            return Err(TodoError::validation(PAST_DATE_NEW));
        }

        Ok(())
    }

    pub fn payload(&self) -> TodoPayload {
        TodoPayload {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            status: self.status,
            icon: self.icon.clone().filter(|icon| !icon.is_empty()),
            created_at: self.date,
        }
    }
}

/// Outcome of [`TodoStore::refresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// A fresh list replaced the old one.
    Applied(usize),
    /// Another refresh was already running; it will fetch again and apply
    /// the newest result.
    Deferred,
}

#[derive(Debug, Default)]
struct State {
    todos: Vec<Todo>,
    criteria: FilterCriteria,
    generation: u64,
    pending_delete: Option<Todo>,
}

/// Holds the in-flight flag of a list fetch. Dropping it clears the flag,
/// so an abandoned refresh never blocks the next one.
struct Loading<'a>(&'a AtomicBool);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The loaded todo list and every action on it.
///
/// Each action makes one remote call and, on success, refetches the whole
/// list; nothing is changed locally ahead of the server. Only one list
/// fetch runs at a time. Mutations are not serialized against each other:
/// callers keep a control disabled while its action is pending.
pub struct TodoStore {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    clock: fn() -> NaiveDate,
    loading: AtomicBool,
    state: Mutex<State>,
}

impl TodoStore {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            clock: today,
            loading: AtomicBool::new(false),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// The list as last fetched.
    pub async fn todos(&self) -> Vec<Todo> {
        self.state.lock().await.todos.clone()
    }

    /// The list after the current criteria, favorites first.
    pub async fn visible(&self) -> Vec<Todo> {
        let state = self.state.lock().await;
        filter::apply(&state.todos, &state.criteria)
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.state.lock().await.criteria.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn find(&self, id: &Id) -> Option<Todo> {
        let state = self.state.lock().await;
        state
            .todos
            .iter()
            .find(|todo| todo.id.as_ref() == Some(id))
            .cloned()
    }

    pub async fn set_criteria(&self, criteria: FilterCriteria) -> Result<Refresh> {
        self.state.lock().await.criteria = criteria;
        self.refresh().await
    }

    /// Replaces the list with a fresh copy from the server. The favorites
    /// endpoint is used while the criteria ask for favorites only.
    ///
    /// A refresh requested while one is in flight is not issued. The
    /// running one notices the newer request, drops its own response and
    /// fetches again, so the last requested refresh is the one applied.
    pub async fn refresh(&self) -> Result<Refresh> {
        let (loading, mut generation, mut favorites) = {
            let mut state = self.state.lock().await;
            state.generation += 1;

            if self.loading.swap(true, Ordering::SeqCst) {
                debug!(generation = state.generation, "refresh already in flight");
                return Ok(Refresh::Deferred);
            }

            (
                Loading(&self.loading),
                state.generation,
                state.criteria.only_favorites,
            )
        };

        let result = loop {
            let result = if favorites {
                self.client.list_favorites().await
            } else {
                self.client.list_todos().await
            };

            let mut state = self.state.lock().await;

            if state.generation != generation {
                debug!(
                    stale = generation,
                    latest = state.generation,
                    "discarding stale todo list"
                );
                generation = state.generation;
                favorites = state.criteria.only_favorites;
                continue;
            }

            let result = result.map(|todos| {
                let count = todos.len();
                state.todos = todos;
                count
            });

            // cleared while the state is still locked
            drop(loading);
            break result;
        };

        match result {
            Ok(count) => {
                debug!(count, favorites, "todo list refreshed");
                Ok(Refresh::Applied(count))
            }
            Err(err) => Err(self.fail(&err, "Failed to load todos").await),
        }
    }

    pub async fn create(&self, draft: &TodoDraft) -> Result<()> {
        let today = (self.clock)();
        let valid = {
            let state = self.state.lock().await;
            draft.validate_for_create(&state.todos, today)
        };
        valid.map_err(|err| self.reject(err))?;

        match self.client.create_todo(&draft.payload()).await {
            Ok(()) => {
                info!(title = %draft.title, status = ?draft.status, "created todo");
                self.succeeded("Todo added successfully").await
            }
            Err(err) => Err(self.fail(&err, "Failed to add todo").await),
        }
    }

    pub async fn update(&self, draft: &TodoDraft) -> Result<()> {
        let today = (self.clock)();
        let id = {
            let state = self.state.lock().await;
            draft.validate_for_update(&state.todos, today)
        };
        let id = id.map_err(|err| self.reject(err))?;

        match self.client.update_todo(&id, &draft.payload()).await {
            Ok(()) => {
                info!(%id, title = %draft.title, "updated todo");
                self.succeeded("Todo updated successfully").await
            }
            Err(err) => Err(self.fail(&err, "Failed to update todo").await),
        }
    }

    pub async fn change_status(&self, todo: &Todo, status: TodoStatus) -> Result<()> {
        let id = self.require_id(todo)?;

        match self.client.change_status(&id, status).await {
            Ok(()) => {
                info!(%id, ?status, "updated todo status");
                self.succeeded("Status updated successfully").await
            }
            Err(err) => Err(self.fail(&err, "Failed to update status").await),
        }
    }

    /// Sends the negation of the favorite flag `todo` was displayed with.
    pub async fn toggle_favorite(&self, todo: &Todo) -> Result<()> {
        let id = self.require_id(todo)?;
        let is_favorite = !todo.is_favorite;

        match self.client.set_favorite(&id, is_favorite).await {
            Ok(()) => {
                info!(%id, is_favorite, "toggled favorite");
                let message = if is_favorite {
                    "Added to favorites"
                } else {
                    "Removed from favorites"
                };
                self.succeeded(message).await
            }
            Err(err) => Err(self.fail(&err, "Failed to update favorite").await),
        }
    }

    /// First half of a delete: remembers the todo until
    /// [`confirm_delete`](Self::confirm_delete) or
    /// [`cancel_delete`](Self::cancel_delete). Makes no remote call.
    pub async fn mark_for_delete(&self, todo: &Todo) -> Result<()> {
        self.require_id(todo)?;
        self.state.lock().await.pending_delete = Some(todo.clone());
        Ok(())
    }

    pub async fn pending_delete(&self) -> Option<Todo> {
        self.state.lock().await.pending_delete.clone()
    }

    pub async fn cancel_delete(&self) {
        self.state.lock().await.pending_delete = None;
    }

    /// Deletes the marked todo. Returns `false` when nothing was marked. On
    /// failure the mark is kept.
    pub async fn confirm_delete(&self) -> Result<bool> {
        let pending = self.pending_delete().await;
        let Some((id, title)) = pending.and_then(|todo| Some((todo.id?, todo.title))) else {
            debug!("confirm_delete without a marked todo");
            return Ok(false);
        };

        match self.client.delete_todo(&id).await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    if state
                        .pending_delete
                        .as_ref()
                        .is_some_and(|todo| todo.id.as_ref() == Some(&id))
                    {
                        state.pending_delete = None;
                    }
                }

                info!(%id, %title, "deleted todo");
                self.succeeded("Todo deleted successfully").await?;
                Ok(true)
            }
            Err(err) => Err(self.fail(&err, "Failed to delete todo").await),
        }
    }

    fn require_id(&self, todo: &Todo) -> Result<Id> {
        todo.id
            .clone()
            .ok_or_else(|| self.reject(TodoError::validation(INVALID_ID)))
    }

    /// Reports a completed mutation and reloads the list. Only a lost
    /// session is passed on; other refresh failures are already reported.
    async fn succeeded(&self, message: &str) -> Result<()> {
        self.notifier.success(message);

        match self.refresh().await {
            Err(TodoError::AuthExpired) => Err(TodoError::AuthExpired),
            Err(err) => {
                debug!("refresh after mutation failed: {}", err);
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    fn reject(&self, err: TodoError) -> TodoError {
        warn!("rejected: {}", err);
        self.notifier.error(&err.to_string());
        err
    }

    async fn fail(&self, err: &ApiError, fallback: &str) -> TodoError {
        error!("{}: {}", fallback, err);

        let failure = TodoError::from_api(err, fallback);
        match &failure {
            TodoError::AuthExpired => self.client.session().clear().await,
            failure => self.notifier.error(&failure.to_string()),
        }

        failure
    }
}
