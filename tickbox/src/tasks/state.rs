//! Plain state types held by the [`TaskManager`](super::TaskManager).

use std::fmt;

use tickbox_proto::task::{DEFAULT_SHOW_COMPLETED, Task};

/// The kinds of task mutation tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Add,
    Toggle,
    Delete,
    Edit,
}

impl ActionKind {
    /// Every action kind, in display order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Toggle, Self::Delete, Self::Edit];
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Toggle => write!(f, "toggle"),
            Self::Delete => write!(f, "delete"),
            Self::Edit => write!(f, "edit"),
        }
    }
}

/// Per-kind in-flight state: `Idle -> Pending -> Idle`.
///
/// Nothing is queued. While a kind is `Pending` the caller must not start
/// another operation of that kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Pending,
}

/// In-flight state for each [`ActionKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionLoading {
    add: ActionState,
    toggle: ActionState,
    delete: ActionState,
    edit: ActionState,
}

impl ActionLoading {
    /// State of `kind`.
    #[must_use]
    pub const fn get(&self, kind: ActionKind) -> ActionState {
        match kind {
            ActionKind::Add => self.add,
            ActionKind::Toggle => self.toggle,
            ActionKind::Delete => self.delete,
            ActionKind::Edit => self.edit,
        }
    }

    /// Whether an operation of `kind` is in flight.
    #[must_use]
    pub fn is_pending(&self, kind: ActionKind) -> bool {
        self.get(kind) == ActionState::Pending
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub fn any_pending(&self) -> bool {
        ActionKind::ALL.iter().any(|k| self.is_pending(*k))
    }

    pub(crate) const fn set(&mut self, kind: ActionKind, state: ActionState) {
        match kind {
            ActionKind::Add => self.add = state,
            ActionKind::Toggle => self.toggle = state,
            ActionKind::Delete => self.delete = state,
            ActionKind::Edit => self.edit = state,
        }
    }
}

/// Task totals over the full, unfiltered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
}

impl Counts {
    /// Count `tasks`.
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            completed,
            active: tasks.len() - completed,
        }
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} active, {} completed",
            self.total, self.active, self.completed
        )
    }
}

/// Everything a front-end needs to render the task screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoState {
    /// The full task list, in insertion order.
    pub todos: Vec<Task>,
    /// True until the initial load finishes, and during a reload.
    pub is_loading: bool,
    /// Whether `todos` reflects the stored list. False until a load of the
    /// list succeeds.
    pub todos_loaded: bool,
    /// Message of the last failed operation.
    pub error: Option<String>,
    /// Whether completed tasks are shown.
    pub show_completed: bool,
    /// Per-kind in-flight state.
    pub action_loading: ActionLoading,
}

impl Default for TodoState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            is_loading: true,
            todos_loaded: false,
            error: None,
            show_completed: DEFAULT_SHOW_COMPLETED,
            action_loading: ActionLoading::default(),
        }
    }
}

impl TodoState {
    /// Tasks visible under the current filter.
    #[must_use]
    pub fn filtered_todos(&self) -> Vec<Task> {
        filter_tasks(&self.todos, self.show_completed)
    }

    /// Totals over the full list.
    #[must_use]
    pub fn counts(&self) -> Counts {
        Counts::of(&self.todos)
    }
}

/// All of `tasks` when `show_completed`, otherwise only the active ones.
/// Relative order is preserved.
#[must_use]
pub fn filter_tasks(tasks: &[Task], show_completed: bool) -> Vec<Task> {
    if show_completed {
        tasks.to_vec()
    } else {
        tasks.iter().filter(|t| !t.completed).cloned().collect()
    }
}
