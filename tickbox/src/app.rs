//! Command-line front-end: one [`Command`] per invocation, run against a
//! mounted [`TaskManager`].

use std::fmt::Write as _;
use std::sync::Arc;

use tickbox_proto::task::{Task, TaskId};
use tickbox_proto::validation::{self, ValidationError};

use crate::persistence::PersistenceError;
use crate::report::ErrorReporter;
use crate::store::KeyValueStore;
use crate::tasks::{TaskManager, filter_tasks};

/// A single front-end command.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show todos under the current filter.
    List {
        /// Only show tasks that are not completed.
        #[arg(long)]
        active: bool,
    },
    /// Add a new todo.
    Add {
        /// Todo text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Flip a todo between done and not done.
    Toggle {
        /// Todo id or unique prefix.
        id: String,
    },
    /// Replace the text of a todo.
    Edit {
        /// Todo id or unique prefix.
        id: String,
        /// New text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove a todo.
    Delete {
        /// Todo id or unique prefix.
        id: String,
    },
    /// Toggle whether completed todos are shown.
    Filter,
    /// Reload the stored todo list.
    Retry,
    /// Remove all stored data.
    Reset,
}

impl Default for Command {
    fn default() -> Self {
        Self::List { active: false }
    }
}

/// Errors surfaced to the user by [`App::execute`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The todo text was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A storage operation failed after every retry.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The stored list could not be loaded, so it must not be overwritten.
    #[error("todos could not be loaded: {0}")]
    Unavailable(String),

    /// A change was not saved.
    #[error("{0}")]
    Failed(String),

    /// No todo has the given id.
    #[error("no todo matches `{0}`")]
    UnknownTask(String),

    /// More than one todo id starts with the given prefix.
    #[error("`{0}` matches more than one todo")]
    AmbiguousTask(String),
}

/// The front-end: owns the manager and the reporter it writes to.
pub struct App<S: KeyValueStore> {
    manager: TaskManager<S>,
    reporter: Arc<ErrorReporter>,
}

impl<S: KeyValueStore> App<S> {
    /// Wrap an already mounted manager.
    pub const fn new(manager: TaskManager<S>, reporter: Arc<ErrorReporter>) -> Self {
        Self { manager, reporter }
    }

    /// The underlying manager.
    pub const fn manager(&self) -> &TaskManager<S> {
        &self.manager
    }

    /// Run `command` and return the text to print.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when input is rejected, an id does not resolve,
    /// the initial load failed, or storage fails after every retry.
    pub async fn execute(&self, command: Command) -> Result<String, AppError> {
        tracing::debug!(?command, "executing command");
        match command {
            Command::List { active } => {
                self.ensure_loaded()?;
                Ok(self.render(active))
            }
            Command::Add { text } => {
                self.ensure_loaded()?;
                let text = self.validated(&text.join(" "))?;
                let task = self.manager.add_todo(&text).await?;
                Ok(format!("Added {}", task.id))
            }
            Command::Toggle { id } => {
                self.ensure_loaded()?;
                let id = self.resolve(&id)?;
                self.manager.toggle_todo(&id).await?;
                let done = self
                    .manager
                    .todos()
                    .iter()
                    .any(|t| t.id == id && t.completed);
                Ok(format!(
                    "Marked {id} as {}",
                    if done { "done" } else { "not done" }
                ))
            }
            Command::Edit { id, text } => {
                self.ensure_loaded()?;
                let id = self.resolve(&id)?;
                let text = self.validated(&text.join(" "))?;
                self.manager.edit_todo(&id, &text).await?;
                Ok(format!("Updated {id}"))
            }
            Command::Delete { id } => {
                self.ensure_loaded()?;
                let id = self.resolve(&id)?;
                self.manager.delete_todo(&id).await?;
                Ok(format!("Deleted {id}"))
            }
            Command::Filter => {
                let shown = self.manager.toggle_show_completed().await;
                if let Some(error) = self.manager.error() {
                    return Err(AppError::Failed(error));
                }
                Ok(if shown {
                    "Showing all todos".to_string()
                } else {
                    "Hiding completed todos".to_string()
                })
            }
            Command::Retry => {
                self.manager.retry_last_operation().await;
                match self.manager.error() {
                    Some(error) => Err(AppError::Unavailable(error)),
                    None => Ok(format!("Reloaded: {}", self.manager.counts())),
                }
            }
            Command::Reset => {
                self.manager.persistence().clear().await?;
                Ok("Cleared all stored data".to_string())
            }
        }
    }

    /// Refuse to act on a task list that failed to load.
    fn ensure_loaded(&self) -> Result<(), AppError> {
        if self.manager.todos_loaded() {
            return Ok(());
        }
        Err(AppError::Unavailable(
            self.manager
                .error()
                .unwrap_or_else(|| "task list not loaded".to_string()),
        ))
    }

    /// Validate `raw`, reporting rejections, and return it trimmed.
    fn validated(&self, raw: &str) -> Result<String, AppError> {
        if let Err(e) = validation::check_task_text(raw) {
            self.reporter.report_validation_error(e.to_string(), raw);
            return Err(e.into());
        }
        Ok(raw.trim().to_string())
    }

    /// Resolve a full id or unique prefix to a task id.
    fn resolve(&self, needle: &str) -> Result<TaskId, AppError> {
        let todos = self.manager.todos();
        if let Some(task) = todos.iter().find(|t| t.id.as_str() == needle) {
            return Ok(task.id.clone());
        }
        let mut matches = todos.iter().filter(|t| t.id.as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) if !needle.is_empty() => Ok(task.id.clone()),
            (Some(_), _) => Err(AppError::AmbiguousTask(needle.to_string())),
            (None, _) => Err(AppError::UnknownTask(needle.to_string())),
        }
    }

    fn render(&self, active_only: bool) -> String {
        let tasks: Vec<Task> = if active_only {
            filter_tasks(&self.manager.todos(), false)
        } else {
            self.manager.filtered_todos()
        };

        let mut out = String::new();
        if tasks.is_empty() {
            out.push_str("No todos\n");
        }
        for task in &tasks {
            let mark = if task.completed { 'x' } else { ' ' };
            let _ = writeln!(out, "[{mark}] {}  {}", task.id, task.text);
        }
        let _ = write!(out, "{}", self.manager.counts());
        out
    }
}
