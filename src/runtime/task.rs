use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use crate::topology::InstanceInfo;

/// Lifecycle of a record/replay task. Persisted as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Recording,
    FinishRecording,
    Replaying,
    FinishReplaying,
    Error,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinishReplaying | Self::Error)
    }

    /// The state a task is normally in right before entering `self`.
    /// `None` for states only reachable at creation.
    pub fn expected_predecessor(&self) -> Option<TaskState> {
        match self {
            Self::Recording | Self::Error => None,
            Self::FinishRecording => Some(Self::Recording),
            Self::Replaying => Some(Self::FinishRecording),
            Self::FinishReplaying => Some(Self::Replaying),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Recording => 0,
            Self::FinishRecording => 1,
            Self::Replaying => 2,
            Self::FinishReplaying => 3,
            Self::Error => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Recording),
            1 => Some(Self::FinishRecording),
            2 => Some(Self::Replaying),
            3 => Some(Self::FinishReplaying),
            4 => Some(Self::Error),
            _ => None,
        }
    }
}

impl Serialize for TaskState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        TaskState::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown task state {}", code)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Tidb,
}

/// One instance a task was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNode {
    pub kind: NodeKind,
    pub ip: String,
    pub port: u16,
}

impl From<&InstanceInfo> for TargetNode {
    fn from(info: &InstanceInfo) -> Self {
        Self {
            kind: NodeKind::Tidb,
            ip: info.ip.clone(),
            port: info.port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub target: Vec<TargetNode>,
    pub state: TaskState,
    pub start_time: DateTime<Utc>,
    /// Unset until recording is stopped.
    pub end_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(name: &str, start_time: DateTime<Utc>, instances: &[InstanceInfo], state: TaskState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            target: instances.iter().map(TargetNode::from).collect(),
            state,
            start_time,
            end_time: None,
        }
    }

    /// Addresses of every instance in `target`, in order.
    pub fn hosts(&self) -> Vec<String> {
        self.target.iter().map(|t| t.ip.clone()).collect()
    }

    /// Length of the recorded window. Zero when recording was never stopped
    /// or the end precedes the start.
    pub fn replay_duration(&self) -> std::time::Duration {
        self.end_time
            .and_then(|end| (end - self.start_time).to_std().ok())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            state: self.state,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Listing view of a task, without its target set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub name: String,
    pub state: TaskState,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}
