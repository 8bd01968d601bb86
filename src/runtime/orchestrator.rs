use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::channel::{Command, CommandChannel, Switch};
use crate::error::{OrchestratorError, Result};
use crate::runtime::clock::{Clock, SystemClock};
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::storage::TaskStore;
use crate::runtime::task::{Task, TaskState, TaskSummary};
use crate::topology::{InstanceDirectory, InstanceInfo};

/// Drives record and replay tasks across the fleet.
///
/// Task state is a best-effort summary of fleet responses: individual
/// instance failures are logged and never abort an operation, while
/// directory and store failures are returned to the caller.
pub struct Orchestrator {
    directory: Arc<dyn InstanceDirectory>,
    store: Arc<dyn TaskStore>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        directory: Arc<dyn InstanceDirectory>,
        store: Arc<dyn TaskStore>,
        channel: Arc<dyn CommandChannel>,
    ) -> Self {
        Self::with_clock(directory, store, channel, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<dyn InstanceDirectory>,
        store: Arc<dyn TaskStore>,
        channel: Arc<dyn CommandChannel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            store,
            dispatcher: Dispatcher::new(channel),
            clock,
        }
    }

    /// Starts recording `name` on every up instance and persists the task.
    ///
    /// The task targets every up instance that was addressed, whether or not
    /// it accepted. It is created in `Error` state when none did.
    pub async fn start_record(&self, name: &str, start_time: DateTime<Utc>) -> Result<Task> {
        validate_name(name)?;
        debug!(name = %name, time = start_time.timestamp(), "start record task");

        let candidates: Vec<InstanceInfo> = self.directory.list_targets().await?
            .into_iter()
            .filter(InstanceInfo::is_up)
            .collect();
        let hosts: Vec<String> = candidates.iter().map(|i| i.ip.clone()).collect();

        let report = self.dispatcher.dispatch(&hosts, |_| Command::Record {
            name: name.to_string(),
            switch: Switch::On,
            timestamp: start_time.timestamp(),
        }).await;

        let state = if report.success_count() > 0 {
            TaskState::Recording
        } else {
            TaskState::Error
        };
        let task = Task::new(name, start_time, &candidates, state);
        self.store.create(&task).await?;

        info!(
            task_id = %task.id,
            name = %name,
            targets = hosts.len(),
            accepted = report.success_count(),
            state = ?state,
            "Record task created"
        );
        Ok(task)
    }

    /// Stops recording on the task's targets and stamps the end time.
    /// Not guarded against repeats: a second stop overwrites `end_time`.
    pub async fn stop_record(&self, task_id: &str) -> Result<()> {
        debug!(task_id = %task_id, "stop record task");
        let task = self.store.get(task_id).await?;
        expect_predecessor(&task, TaskState::FinishRecording);

        // Commands carry unix seconds, so the stored instant matches them.
        let now = self.clock.now();
        let end_time = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);

        let report = self.dispatcher.dispatch(&task.hosts(), |_| Command::Record {
            name: task.name.clone(),
            switch: Switch::Off,
            timestamp: end_time.timestamp(),
        }).await;

        self.store.update_end_time(task_id, end_time).await?;
        self.store.update_state(task_id, TaskState::FinishRecording).await?;

        info!(task_id = %task_id, accepted = report.success_count(), failed = report.failure_count(), "Recording stopped");
        Ok(())
    }

    /// Replays the recorded window: begin replay, hold for the recorded
    /// duration, end replay. The caller is held for the whole window and
    /// the wait cannot be cut short.
    pub async fn start_replay(&self, task_id: &str) -> Result<()> {
        debug!(task_id = %task_id, "start replay task");
        let task = self.store.get(task_id).await?;
        expect_predecessor(&task, TaskState::Replaying);

        let duration = task.replay_duration();
        let hosts = task.hosts();
        let replay = |switch: Switch| {
            let name = task.name.clone();
            move |_: &str| Command::Replay { name: name.clone(), switch }
        };

        // State is written while the begin commands are still in flight.
        let begin = self.dispatcher.launch(&hosts, replay(Switch::On));
        self.store.update_state(task_id, TaskState::Replaying).await?;
        let report = begin.wait().await;
        info!(task_id = %task_id, accepted = report.success_count(), failed = report.failure_count(), "Replay started");

        debug!(task_id = %task_id, duration = ?duration, "begin sleep");
        self.clock.sleep(duration).await;
        debug!(task_id = %task_id, "stop sleep");

        let report = self.dispatcher.dispatch(&hosts, replay(Switch::Off)).await;
        self.store.update_state(task_id, TaskState::FinishReplaying).await?;

        info!(task_id = %task_id, accepted = report.success_count(), failed = report.failure_count(), "Replay finished");
        Ok(())
    }

    /// Deletes a task in any state. An in-flight replay of the task is not
    /// interrupted.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        debug!(task_id = %task_id, "delete task");
        let task = self.store.get(task_id).await?;
        if task.state == TaskState::Replaying {
            warn!(task_id = %task_id, "Deleting task while replay is in progress");
        }
        self.store.delete(task_id).await?;
        Ok(())
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        Ok(self.store.get(task_id).await?)
    }
}

/// Workload names are embedded verbatim as one command path segment, so
/// only unreserved URL characters are allowed and dot segments are refused.
fn validate_name(name: &str) -> Result<()> {
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-');
    if name.is_empty() || name == "." || name == ".." || !name.chars().all(unreserved) {
        return Err(OrchestratorError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn expect_predecessor(task: &Task, next: TaskState) {
    if let Some(expected) = next.expected_predecessor() {
        if task.state != expected {
            warn!(task_id = %task.id, current = ?task.state, next = ?next, "Task is not in the expected state, proceeding anyway");
        }
    }
}
