//! Persisted data model for `Tickbox`.
//!
//! Everything that crosses the storage boundary lives here: the task
//! model, the storage keys, the JSON codec, and the pure validation
//! rules applied to task text before it reaches the state manager.

pub mod codec;
pub mod task;
pub mod validation;
