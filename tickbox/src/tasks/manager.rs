//! Task manager: the in-memory task list and its persistence protocol.
//!
//! State lives behind a synchronous mutex that is only ever held between
//! suspension points, so each operation reads the latest committed list
//! when it starts rather than a snapshot captured earlier.

use parking_lot::Mutex;
use tickbox_proto::task::{
    self, DEFAULT_SHOW_COMPLETED, SHOW_COMPLETED_KEY, TODOS_KEY, Task, TaskId,
};

use super::state::{ActionKind, ActionLoading, ActionState, Counts, TodoState};
use crate::persistence::{Persistence, PersistenceError};
use crate::store::KeyValueStore;

/// Owns the task list, the filter preference, and the loading/error state
/// a front-end renders.
pub struct TaskManager<S: KeyValueStore> {
    persistence: Persistence<S>,
    state: Mutex<TodoState>,
}

impl<S: KeyValueStore> TaskManager<S> {
    /// Creates a manager in the loading state. Call
    /// [`load_initial`](Self::load_initial) to populate it.
    pub fn new(persistence: Persistence<S>) -> Self {
        Self {
            persistence,
            state: Mutex::new(TodoState::default()),
        }
    }

    /// Creates a manager and runs the initial load.
    pub async fn mount(persistence: Persistence<S>) -> Self {
        let manager = Self::new(persistence);
        manager.load_initial().await;
        manager
    }

    /// Loads the task list and the filter preference concurrently.
    ///
    /// `is_loading` is cleared whatever happens. A failed load leaves the
    /// default for that value in place and sets the error.
    pub async fn load_initial(&self) {
        let (todos, show_completed) = tokio::join!(
            self.persistence.load::<Vec<Task>>(TODOS_KEY),
            self.persistence.load::<bool>(SHOW_COMPLETED_KEY),
        );

        let mut state = self.state.lock();
        let mut failure = None;
        match todos {
            Ok(todos) => {
                state.todos = todos.unwrap_or_default();
                state.todos_loaded = true;
            }
            Err(e) => failure = Some(e),
        }
        match show_completed {
            Ok(value) => state.show_completed = value.unwrap_or(DEFAULT_SHOW_COMPLETED),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
        state.is_loading = false;

        if let Some(e) = failure {
            tracing::warn!(error = %e, "initial load failed");
            state.error = Some(e.to_string());
        } else {
            tracing::info!(
                count = state.todos.len(),
                show_completed = state.show_completed,
                "initial load finished"
            );
        }
    }

    /// Appends a new task with `text` and persists the list.
    ///
    /// `text` must already be validated and trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the save fails; the in-memory list is
    /// left as it was before the call.
    pub async fn add_todo(&self, text: &str) -> Result<Task, PersistenceError> {
        let task = Task::new(text);
        self.commit(ActionKind::Add, |todos| {
            let mut next = todos.to_vec();
            next.push(task.clone());
            next
        })
        .await?;
        Ok(task)
    }

    /// Flips `completed` on the task with `id` and persists the list.
    ///
    /// An unknown `id` still saves the (unchanged) list.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the save fails.
    pub async fn toggle_todo(&self, id: &TaskId) -> Result<(), PersistenceError> {
        self.commit(ActionKind::Toggle, |todos| task::with_toggled(todos, id))
            .await
    }

    /// Removes the task with `id` and persists the list.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the save fails.
    pub async fn delete_todo(&self, id: &TaskId) -> Result<(), PersistenceError> {
        self.commit(ActionKind::Delete, |todos| task::without(todos, id))
            .await
    }

    /// Replaces the text of the task with `id` and persists the list.
    ///
    /// `new_text` must already be validated and trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the save fails.
    pub async fn edit_todo(&self, id: &TaskId, new_text: &str) -> Result<(), PersistenceError> {
        self.commit(ActionKind::Edit, |todos| task::with_text(todos, id, new_text))
            .await
    }

    /// Flips the filter preference immediately, then persists it.
    ///
    /// If the save fails the previous value is restored and the error is
    /// set. Returns the value in effect afterwards.
    pub async fn toggle_show_completed(&self) -> bool {
        let next = {
            let mut state = self.state.lock();
            state.show_completed = !state.show_completed;
            state.error = None;
            state.show_completed
        };

        match self.persistence.save(SHOW_COMPLETED_KEY, &next).await {
            Ok(()) => next,
            Err(e) => {
                tracing::warn!(error = %e, show_completed = !next, "rolling back filter preference");
                let mut state = self.state.lock();
                state.show_completed = !next;
                state.error = Some(e.to_string());
                !next
            }
        }
    }

    /// Reloads the task list from storage.
    ///
    /// This is a full reload, not a replay of whichever operation failed.
    /// A missing stored list keeps the current one. A failed reload leaves
    /// [`todos_loaded`](Self::todos_loaded) as it was.
    pub async fn retry_last_operation(&self) {
        {
            let mut state = self.state.lock();
            state.is_loading = true;
            state.error = None;
        }

        let result = self.persistence.load::<Vec<Task>>(TODOS_KEY).await;

        let mut state = self.state.lock();
        state.is_loading = false;
        match result {
            Ok(Some(todos)) => {
                tracing::info!(count = todos.len(), "reloaded task list");
                state.todos = todos;
                state.todos_loaded = true;
            }
            Ok(None) => {
                tracing::debug!("no stored task list, keeping current");
                state.todos_loaded = true;
            }
            Err(e) => state.error = Some(e.to_string()),
        }
    }

    /// Computes the next list from the current one, saves it, and commits
    /// it only if the save succeeds. The action flag for `kind` is pending
    /// for the duration of the save and always cleared afterwards.
    async fn commit<F>(&self, kind: ActionKind, next: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&[Task]) -> Vec<Task>,
    {
        let next_todos = {
            let mut state = self.state.lock();
            state.action_loading.set(kind, ActionState::Pending);
            next(&state.todos)
        };
        tracing::debug!(action = %kind, count = next_todos.len(), "saving task list");

        let result = self.persistence.save(TODOS_KEY, &next_todos).await;

        let mut state = self.state.lock();
        state.action_loading.set(kind, ActionState::Idle);
        match result {
            Ok(()) => {
                state.todos = next_todos;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action = %kind, error = %e, "task change not saved");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The full task list.
    #[must_use]
    pub fn todos(&self) -> Vec<Task> {
        self.state.lock().todos.clone()
    }

    /// Tasks visible under the current filter, in list order.
    #[must_use]
    pub fn filtered_todos(&self) -> Vec<Task> {
        self.state.lock().filtered_todos()
    }

    /// Totals over the full list.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.state.lock().counts()
    }

    /// Whether completed tasks are shown.
    #[must_use]
    pub fn show_completed(&self) -> bool {
        self.state.lock().show_completed
    }

    /// Whether a load is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    /// Whether the task list has been read from storage.
    #[must_use]
    pub fn todos_loaded(&self) -> bool {
        self.state.lock().todos_loaded
    }

    /// Message of the last failed operation.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Per-kind in-flight state.
    #[must_use]
    pub fn action_loading(&self) -> ActionLoading {
        self.state.lock().action_loading
    }

    /// A copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> TodoState {
        self.state.lock().clone()
    }

    /// The persistence layer this manager writes through.
    pub const fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }
}
