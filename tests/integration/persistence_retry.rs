//! Integration tests for retrying persistence.
//!
//! Drives `Persistence` and `TaskManager` over failure-injecting stores and
//! checks attempt counts, retry timing, error contents, and reporting.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tickbox::persistence::{Operation, Persistence, RetryPolicy};
use tickbox::report::{ErrorKind, ErrorReporter, Severity};
use tickbox::store::{InMemoryStore, KeyValueStore, StoreError};
use tickbox::tasks::TaskManager;
use tickbox_proto::task::TODOS_KEY;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fails every write while `failures_left` is non-zero, counting writes.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryStore,
    failures_left: AtomicU32,
    writes: AtomicU32,
}

impl CountingStore {
    fn failing(times: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            ..Self::default()
        }
    }

    fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }
}

// ===========================================================================
// Persistence
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn save_recovers_on_third_attempt() {
    let persistence = Persistence::new(CountingStore::failing(2));
    let started = tokio::time::Instant::now();

    persistence.save("k", &vec![1, 2, 3]).await.unwrap();

    assert_eq!(persistence.store().writes(), 3);
    assert!(started.elapsed() >= Duration::from_millis(2000));
    let loaded: Option<Vec<i32>> = persistence.load("k").await.unwrap();
    assert_eq!(loaded, Some(vec![1, 2, 3]));
}

#[tokio::test(start_paused = true)]
async fn save_gives_up_after_three_attempts() {
    let reporter = Arc::new(ErrorReporter::default());
    let persistence =
        Persistence::new(CountingStore::failing(u32::MAX)).with_reporter(Arc::clone(&reporter));

    let err = persistence.save(TODOS_KEY, &true).await.unwrap_err();

    assert_eq!(persistence.store().writes(), 3);
    assert_eq!(err.operation, Operation::Save);
    assert_eq!(err.attempts, 3);
    assert_eq!(err.key.as_deref(), Some(TODOS_KEY));
    assert!(err.message.starts_with("Storage operation failed after 3 attempts"));
    assert!(err.message.contains("quota exceeded"));

    let reports = reporter.unhandled();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ErrorKind::Storage);
    assert_eq!(reports[0].severity, Severity::Medium);
    assert_eq!(reports[0].message, err.message);
    assert_eq!(reports[0].context.get("key").map(String::as_str), Some(TODOS_KEY));
}

#[tokio::test]
async fn custom_policy_controls_attempts() {
    let persistence = Persistence::new(CountingStore::failing(u32::MAX)).with_policy(RetryPolicy {
        max_attempts: 5,
        delay: Duration::ZERO,
    });

    let err = persistence.save("k", "v").await.unwrap_err();
    assert_eq!(err.attempts, 5);
    assert_eq!(persistence.store().writes(), 5);
}

#[tokio::test]
async fn load_of_missing_key_is_none() {
    let persistence = Persistence::new(CountingStore::default());
    let value: Option<Vec<String>> = persistence.load("missing").await.unwrap();
    assert!(value.is_none());
}

// ===========================================================================
// TaskManager over a flaky store
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn transient_write_failure_is_invisible_to_manager() {
    let manager = TaskManager::mount(Persistence::new(Arc::new(CountingStore::default()))).await;
    manager.persistence().store().failures_left.store(2, Ordering::SeqCst);

    let task = manager.add_todo("Buy milk").await.unwrap();

    assert_eq!(manager.todos(), vec![task]);
    assert!(manager.error().is_none());
    assert_eq!(manager.persistence().store().writes(), 3);
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_surfaces_once_per_operation() {
    let reporter = Arc::new(ErrorReporter::default());
    let persistence = Persistence::new(CountingStore::failing(u32::MAX))
        .with_reporter(Arc::clone(&reporter));
    let manager = TaskManager::mount(persistence).await;

    assert!(manager.add_todo("Buy milk").await.is_err());
    assert!(manager.todos().is_empty());
    let before = manager.show_completed();
    assert_eq!(manager.toggle_show_completed().await, before);

    assert!(manager.error().is_some());
    assert_eq!(manager.persistence().store().writes(), 6);
    assert_eq!(reporter.len(), 2);
    assert_eq!(reporter.flush().len(), 2);
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn reporter_evicts_oldest_beyond_capacity() {
    let reporter = Arc::new(ErrorReporter::new(2));
    let persistence = Persistence::new(CountingStore::failing(u32::MAX))
        .with_policy(RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        })
        .with_reporter(Arc::clone(&reporter));

    for key in ["a", "b", "c"] {
        let _ = persistence.save(key, &1).await;
    }

    let keys: Vec<String> = reporter
        .unhandled()
        .into_iter()
        .filter_map(|r| r.context.get("key").cloned())
        .collect();
    assert_eq!(keys, vec!["b", "c"]);
}
