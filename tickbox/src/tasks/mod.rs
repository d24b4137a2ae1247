//! Task list state management for `Tickbox`.
//!
//! [`TaskManager`] owns the in-memory task list and keeps it in step with
//! the persistence layer. Task mutations commit only after the save
//! succeeds; the filter preference is flipped optimistically and rolled
//! back if its save fails.

pub mod manager;
pub mod state;

pub use manager::TaskManager;
pub use state::{ActionKind, ActionLoading, ActionState, Counts, TodoState, filter_tasks};
