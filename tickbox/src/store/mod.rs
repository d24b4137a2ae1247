//! Key-value storage abstraction for `Tickbox`.
//!
//! Defines the [`KeyValueStore`] trait that the persistence layer writes
//! through. Concrete implementations include:
//! - [`memory::InMemoryStore`]: process-local map for tests and ephemeral use
//! - [`file::FileStore`]: a single JSON file on disk

pub mod file;
pub mod memory;

use std::sync::Arc;

pub use file::FileStore;
pub use memory::InMemoryStore;

/// Errors that can occur inside a key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing medium could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing medium holds data the store cannot interpret.
    #[error("storage is corrupt: {0}")]
    Corrupt(String),

    /// The store is temporarily unable to serve requests.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Async string-to-string storage primitive.
///
/// Values are opaque strings; serialization happens one layer up in
/// [`Persistence`](crate::persistence::Persistence). Any `Err` returned
/// here counts as a failed attempt for the retry policy.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str)
    -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove every stored value.
    fn clear(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
