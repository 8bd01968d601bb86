mod common;

use common::at;
use recordreplay::error::StoreError;
use recordreplay::runtime::redis_storage::RedisTaskStore;
use recordreplay::runtime::storage::TaskStore;
use recordreplay::runtime::task::{Task, TaskState};
use recordreplay::topology::{ComponentStatus, InstanceInfo};

fn get_redis_client() -> redis::Client {
    let url = std::env::var("RECORDREPLAY_TEST_REDIS")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/6".to_string());
    redis::Client::open(url).expect("Invalid Redis URL")
}

#[tokio::test]
#[ignore] // Needs a running Redis; run with --ignored
async fn test_redis_task_store_lifecycle() {
    let namespace = format!("recordreplay-test-{}", uuid::Uuid::new_v4());
    let store = RedisTaskStore::new(get_redis_client(), namespace);

    let instances = vec![
        InstanceInfo::new("10.0.0.1", ComponentStatus::Up),
        InstanceInfo::new("10.0.0.2", ComponentStatus::Up),
    ];
    let first = Task::new("orders", at(100), &instances, TaskState::Recording);
    let second = Task::new("payments", at(200), &[], TaskState::Error);

    store.create(&first).await.expect("create failed");
    store.create(&second).await.expect("create failed");
    assert!(matches!(store.create(&first).await, Err(StoreError::Duplicate(_))));

    assert_eq!(store.get(&first.id).await.unwrap(), first);

    store.update_end_time(&first.id, at(160)).await.unwrap();
    store.update_state(&first.id, TaskState::FinishRecording).await.unwrap();
    let stored = store.get(&first.id).await.unwrap();
    assert_eq!(stored.end_time, Some(at(160)));
    assert_eq!(stored.state, TaskState::FinishRecording);
    assert_eq!(stored.target, first.target);

    let names: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["orders", "payments"]);

    assert!(matches!(store.update_state("missing", TaskState::Error).await, Err(StoreError::NotFound(_))));

    store.delete(&first.id).await.unwrap();
    store.delete(&second.id).await.unwrap();
    assert!(matches!(store.delete(&first.id).await, Err(StoreError::NotFound(_))));
    assert!(store.list().await.unwrap().is_empty());
}
