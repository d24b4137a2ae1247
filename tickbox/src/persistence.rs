//! Typed persistence over a [`KeyValueStore`] with bounded retries.
//!
//! [`Persistence`] serializes values to JSON, hands the strings to the
//! store, and retries every operation according to its [`RetryPolicy`]:
//! a fixed number of total attempts with a fixed sleep in between. The
//! caller only ever sees success or the final [`PersistenceError`];
//! intermediate failures are logged and retried in place.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tickbox_proto::codec;

use crate::report::ErrorReporter;
use crate::store::KeyValueStore;

/// Default number of total attempts per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Which persistence operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Save,
    Load,
    Remove,
    Clear,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::Load => write!(f, "load"),
            Self::Remove => write!(f, "remove"),
            Self::Clear => write!(f, "clear"),
        }
    }
}

/// Terminal failure of a persistence operation, raised once every attempt
/// has failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    /// The operation that failed.
    pub operation: Operation,
    /// Human-readable description including the attempt count and last cause.
    pub message: String,
    /// The storage key involved, if the operation had one.
    pub key: Option<String>,
    /// How many attempts were made.
    pub attempts: u32,
}

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Effective number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

/// JSON persistence with retries on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence<S: KeyValueStore> {
    store: S,
    policy: RetryPolicy,
    reporter: Option<Arc<ErrorReporter>>,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wrap `store` with the default retry policy and no reporter.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            reporter: None,
        }
    }

    /// Use `policy` instead of the default.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Push terminal failures into `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The active retry policy.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Serialize `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] once serialization or the store write
    /// has failed on every attempt.
    pub async fn save<T>(&self, key: &str, value: &T) -> Result<(), PersistenceError>
    where
        T: Serialize + ?Sized,
    {
        self.retry(Operation::Save, Some(key), move || async move {
            let raw = codec::encode(value)
                .map_err(|e| format!("failed to serialize or save data: {e}"))?;
            tracing::debug!(key, bytes = raw.len(), "writing value");
            self.store
                .set(key, raw)
                .await
                .map_err(|e| format!("failed to serialize or save data: {e}"))
        })
        .await
    }

    /// Load and deserialize the value stored under `key`.
    ///
    /// A missing key yields `Ok(None)` and is not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] once the store read or parsing has
    /// failed on every attempt.
    pub async fn load<T>(&self, key: &str) -> Result<Option<T>, PersistenceError>
    where
        T: DeserializeOwned,
    {
        self.retry(Operation::Load, Some(key), move || async move {
            let raw = self
                .store
                .get(key)
                .await
                .map_err(|e| format!("failed to load or parse data: {e}"))?;
            match raw {
                Some(raw) => codec::decode(&raw)
                    .map(Some)
                    .map_err(|e| format!("failed to load or parse data: {e}")),
                None => Ok(None),
            }
        })
        .await
    }

    /// Remove the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] once the store delete has failed on
    /// every attempt.
    pub async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.retry(Operation::Remove, Some(key), move || async move {
            self.store
                .delete(key)
                .await
                .map_err(|e| format!("failed to remove data: {e}"))
        })
        .await
    }

    /// Remove every stored value.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] once the store clear has failed on
    /// every attempt.
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.retry(Operation::Clear, None, move || async move {
            self.store
                .clear()
                .await
                .map_err(|e| format!("failed to clear storage: {e}"))
        })
        .await
    }

    /// Run `attempt` until it succeeds or the policy is exhausted, sleeping
    /// `policy.delay` between attempts.
    async fn retry<T, F, Fut>(
        &self,
        operation: Operation,
        key: Option<&str>,
        mut attempt: F,
    ) -> Result<T, PersistenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let max_attempts = self.policy.attempts();
        let mut made = 1;
        loop {
            match attempt().await {
                Ok(value) => {
                    if made > 1 {
                        tracing::debug!(%operation, ?key, attempts = made, "storage operation recovered");
                    }
                    return Ok(value);
                }
                Err(cause) if made < max_attempts => {
                    tracing::warn!(
                        %operation,
                        ?key,
                        attempt = made,
                        max_attempts,
                        error = %cause,
                        "storage operation failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    made += 1;
                }
                Err(cause) => {
                    let err = PersistenceError {
                        operation,
                        message: format!(
                            "Storage operation failed after {max_attempts} attempts: {cause}"
                        ),
                        key: key.map(str::to_string),
                        attempts: max_attempts,
                    };
                    tracing::error!(%operation, ?key, attempts = max_attempts, error = %cause, "storage operation gave up");
                    self.report(&err);
                    return Err(err);
                }
            }
        }
    }

    fn report(&self, err: &PersistenceError) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        let mut context = BTreeMap::from([
            ("operation".to_string(), err.operation.to_string()),
            ("attempts".to_string(), err.attempts.to_string()),
        ]);
        if let Some(key) = &err.key {
            context.insert("key".to_string(), key.clone());
        }
        reporter.report_storage_error(err.message.clone(), context);
    }
}
