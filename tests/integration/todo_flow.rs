//! Integration tests for the todo workflow.
//!
//! Tests the full add/toggle/edit/delete scenario through `TaskManager`,
//! state surviving a restart on a `FileStore`, and the command front-end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tickbox::app::{App, AppError, Command};
use tickbox::persistence::{Persistence, RetryPolicy};
use tickbox::report::{ErrorKind, ErrorReporter};
use tickbox::store::{FileStore, InMemoryStore, KeyValueStore};
use tickbox::tasks::TaskManager;
use tickbox_proto::task::{SHOW_COMPLETED_KEY, TODOS_KEY};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

const FAST: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    delay: Duration::ZERO,
};

/// A fresh, unique directory under the system temp dir.
fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("tickbox-flow-{}", uuid::Uuid::now_v7()))
}

async fn mount<S: KeyValueStore>(store: S) -> TaskManager<S> {
    TaskManager::mount(Persistence::new(store).with_policy(FAST)).await
}

/// Mount an `App` over the file store in `dir`, as one CLI invocation does.
async fn open_app(dir: &Path, reporter: &Arc<ErrorReporter>) -> App<FileStore> {
    let persistence = Persistence::new(FileStore::open(dir).await.unwrap())
        .with_policy(FAST)
        .with_reporter(Arc::clone(reporter));
    App::new(TaskManager::mount(persistence).await, Arc::clone(reporter))
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

// ===========================================================================
// Manager scenario
// ===========================================================================

#[tokio::test]
async fn add_toggle_edit_delete_scenario() {
    let manager = mount(InMemoryStore::new()).await;
    assert!(manager.todos().is_empty());

    let task = manager.add_todo("Buy milk").await.unwrap();
    assert_eq!(manager.todos().len(), 1);
    assert!(!manager.todos()[0].completed);

    manager.toggle_todo(&task.id).await.unwrap();
    assert!(manager.todos()[0].completed);

    manager.edit_todo(&task.id, "Buy oat milk").await.unwrap();
    let edited = &manager.todos()[0];
    assert_eq!(edited.text, "Buy oat milk");
    assert!(edited.completed);

    manager.delete_todo(&task.id).await.unwrap();
    assert!(manager.todos().is_empty());
    assert!(manager.error().is_none());
    assert!(!manager.action_loading().any_pending());
}

// ===========================================================================
// FileStore persistence across restarts
// ===========================================================================

#[tokio::test]
async fn state_survives_remount_on_file_store() {
    let dir = temp_data_dir();

    let (milk_id, dog_id) = {
        let manager = mount(FileStore::open(&dir).await.unwrap()).await;
        let milk = manager.add_todo("Buy milk").await.unwrap();
        let dog = manager.add_todo("Walk dog").await.unwrap();
        manager.toggle_todo(&milk.id).await.unwrap();
        assert!(!manager.toggle_show_completed().await);
        (milk.id, dog.id)
    };

    let manager = mount(FileStore::open(&dir).await.unwrap()).await;
    assert!(!manager.is_loading());
    assert!(manager.error().is_none());
    assert!(!manager.show_completed());

    let todos = manager.todos();
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0].id, milk_id);
    assert!(todos[0].completed);
    assert_eq!(todos[1].id, dog_id);

    let visible = manager.filtered_todos();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].text, "Walk dog");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn file_store_holds_persisted_layout() {
    let dir = temp_data_dir();
    let store = FileStore::open(&dir).await.unwrap();
    let manager = mount(store).await;
    let task = manager.add_todo("Buy milk").await.unwrap();

    let raw = manager.persistence().store().get(TODOS_KEY).await.unwrap().unwrap();
    assert_eq!(
        raw,
        format!(r#"[{{"id":"{}","text":"Buy milk","completed":false}}]"#, task.id)
    );
    assert!(
        manager
            .persistence()
            .store()
            .get(SHOW_COMPLETED_KEY)
            .await
            .unwrap()
            .is_none()
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn corrupt_file_is_reported_on_mount() {
    let dir = temp_data_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("store.json"), "{ not json").unwrap();

    let reporter = Arc::new(ErrorReporter::default());
    let persistence = Persistence::new(FileStore::open(&dir).await.unwrap())
        .with_policy(FAST)
        .with_reporter(Arc::clone(&reporter));
    let manager = TaskManager::mount(persistence).await;

    assert!(!manager.is_loading());
    assert!(manager.error().is_some());
    assert!(manager.todos().is_empty());
    assert!(
        reporter
            .unhandled()
            .iter()
            .all(|r| r.kind == ErrorKind::Storage)
    );
    assert_eq!(reporter.len(), 2, "one report per key");

    std::fs::remove_dir_all(&dir).unwrap();
}

// ===========================================================================
// Command front-end
// ===========================================================================

#[tokio::test]
async fn commands_run_against_file_store() {
    let dir = temp_data_dir();
    let reporter = Arc::new(ErrorReporter::default());

    let app = open_app(&dir, &reporter).await;
    let added = app
        .execute(Command::Add {
            text: words("Buy milk"),
        })
        .await
        .unwrap();
    let id = added.strip_prefix("Added ").unwrap().to_string();
    drop(app);

    let app = open_app(&dir, &reporter).await;
    app.execute(Command::Toggle { id: id[..8].to_string() })
        .await
        .unwrap();
    let listed = app.execute(Command::default()).await.unwrap();
    assert_eq!(
        listed,
        format!("[x] {id}  Buy milk\n1 total, 0 active, 1 completed")
    );

    let err = app
        .execute(Command::Edit {
            id: id.clone(),
            text: words("x"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(reporter.unhandled().len(), 1);

    app.execute(Command::Delete { id }).await.unwrap();
    app.execute(Command::Reset).await.unwrap();
    assert!(!dir.join("store.json").exists());

    std::fs::remove_dir_all(&dir).unwrap();
}
