mod common;

use common::at;
use recordreplay::channel::{Command, Switch};
use recordreplay::runtime::task::{Task, TaskState};
use recordreplay::topology::{ComponentStatus, InstanceInfo};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_record_command_url() {
    let on = Command::Record { name: "orders".to_string(), switch: Switch::On, timestamp: 1650000000 };
    let off = Command::Record { name: "orders".to_string(), switch: Switch::Off, timestamp: 1650000060 };

    assert_eq!(on.url("10.0.1.7", 10080), "http://10.0.1.7:10080/record/orders/on/1650000000");
    assert_eq!(off.url("10.0.1.7", 10080), "http://10.0.1.7:10080/record/orders/off/1650000060");
}

#[test]
fn test_replay_command_url() {
    let on = Command::Replay { name: "orders".to_string(), switch: Switch::On };
    let off = Command::Replay { name: "orders".to_string(), switch: Switch::Off };

    assert_eq!(on.url("tidb-0", 10080), "http://tidb-0:10080/replay/orders/on");
    assert_eq!(off.url("tidb-0", 10080), "http://tidb-0:10080/replay/orders/off");
}

#[test]
fn test_task_json_shape() {
    let mut instance = InstanceInfo::new("10.0.1.7", ComponentStatus::Up);
    instance.port = 4001;
    let mut task = Task::new("orders", at(100), &[instance], TaskState::FinishRecording);
    task.end_time = Some(at(160));

    let value = serde_json::to_value(&task).unwrap();

    assert_eq!(value["state"], json!(1));
    assert_eq!(value["target"], json!([{ "kind": "tidb", "ip": "10.0.1.7", "port": 4001 }]));
    assert_eq!(value["name"], json!("orders"));
    assert!(value["id"].as_str().unwrap().len() <= 40);

    let back: Task = serde_json::from_value(value).unwrap();
    assert_eq!(back, task);
}

#[test]
fn test_unknown_state_code_rejected() {
    assert!(serde_json::from_value::<TaskState>(json!(9)).is_err());
    assert_eq!(serde_json::from_value::<TaskState>(json!(4)).unwrap(), TaskState::Error);
}

#[test]
fn test_replay_duration() {
    let mut task = Task::new("wl", at(100), &[], TaskState::Recording);
    assert_eq!(task.replay_duration(), Duration::ZERO);

    task.end_time = Some(at(160));
    assert_eq!(task.replay_duration(), Duration::from_secs(60));

    task.end_time = Some(at(40));
    assert_eq!(task.replay_duration(), Duration::ZERO);
}

#[test]
fn test_state_helpers() {
    assert!(TaskState::Error.is_terminal());
    assert!(TaskState::FinishReplaying.is_terminal());
    assert!(!TaskState::Replaying.is_terminal());
    assert_eq!(TaskState::Replaying.expected_predecessor(), Some(TaskState::FinishRecording));
    assert_eq!(TaskState::Recording.expected_predecessor(), None);
}
