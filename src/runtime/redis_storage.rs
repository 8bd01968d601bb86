use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use crate::error::StoreError;
use crate::runtime::storage::TaskStore;
use crate::runtime::task::{Task, TaskState, TaskSummary};

const CREATE_SCRIPT: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 1 then
        return 0
    end
    local fields = {}
    for i = 2, #ARGV do
        fields[#fields + 1] = ARGV[i]
    end
    redis.call("HSET", KEYS[1], unpack(fields))
    redis.call("RPUSH", KEYS[2], ARGV[1])
    return 1
"#;

// HSET on a missing key would create a partial record.
const UPDATE_SCRIPT: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 0 then
        return 0
    end
    redis.call("HSET", KEYS[1], ARGV[1], ARGV[2])
    return 1
"#;

const DELETE_SCRIPT: &str = r#"
    if redis.call("DEL", KEYS[1]) == 0 then
        return 0
    end
    redis.call("LREM", KEYS[2], 0, ARGV[1])
    return 1
"#;

/// Task store backed by Redis: one hash per task plus a list of ids in
/// creation order.
pub struct RedisTaskStore {
    client: redis::Client,
    namespace: String,
    create_script: redis::Script,
    update_script: redis::Script,
    delete_script: redis::Script,
}

impl RedisTaskStore {
    pub fn new(client: redis::Client, namespace: String) -> Self {
        Self {
            client,
            namespace,
            create_script: redis::Script::new(CREATE_SCRIPT),
            update_script: redis::Script::new(UPDATE_SCRIPT),
            delete_script: redis::Script::new(DELETE_SCRIPT),
        }
    }

    fn task_key(&self, id: &str) -> String {
        format!("{}:task:{}", self.namespace, id)
    }

    fn index_key(&self) -> String {
        format!("{}:tasks", self.namespace)
    }

    async fn update_field(&self, id: &str, field: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let updated: i32 = self.update_script
            .key(self.task_key(id))
            .arg(field)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn encode_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339()).unwrap_or_default()
}

fn decode_time(raw: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    if raw.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {:?}: {}", raw, e)))
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, StoreError> {
    fields.get(name)
        .map(String::as_str)
        .ok_or_else(|| StoreError::Corrupt(format!("missing field {}", name)))
}

fn decode_summary(fields: &HashMap<String, String>) -> Result<TaskSummary, StoreError> {
    let raw_state = field(fields, "state")?;
    let state = raw_state.parse::<u8>().ok()
        .and_then(TaskState::from_code)
        .ok_or_else(|| StoreError::Corrupt(format!("bad state {:?}", raw_state)))?;
    let start_time = decode_time(field(fields, "start_time")?)?
        .ok_or_else(|| StoreError::Corrupt("empty start_time".to_string()))?;

    Ok(TaskSummary {
        id: field(fields, "id")?.to_string(),
        name: field(fields, "name")?.to_string(),
        state,
        start_time,
        end_time: decode_time(field(fields, "end_time")?)?,
    })
}

fn decode_task(fields: &HashMap<String, String>) -> Result<Task, StoreError> {
    let summary = decode_summary(fields)?;
    let target = serde_json::from_str(field(fields, "target")?)
        .map_err(|e| StoreError::Corrupt(format!("bad target: {}", e)))?;

    Ok(Task {
        id: summary.id,
        name: summary.name,
        target,
        state: summary.state,
        start_time: summary.start_time,
        end_time: summary.end_time,
    })
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn create(&self, task: &Task) -> Result<(), StoreError> {
        let target = serde_json::to_string(&task.target)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let fields = vec![
            "id".to_string(), task.id.clone(),
            "name".to_string(), task.name.clone(),
            "target".to_string(), target,
            "state".to_string(), task.state.code().to_string(),
            "start_time".to_string(), encode_time(Some(task.start_time)),
            "end_time".to_string(), encode_time(task.end_time),
        ];

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let created: i32 = self.create_script
            .key(self.task_key(&task.id))
            .key(self.index_key())
            .arg(&task.id)
            .arg(fields)
            .invoke_async(&mut conn)
            .await?;
        if created == 0 {
            return Err(StoreError::Duplicate(task.id.clone()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.task_key(id))
            .query_async(&mut conn)
            .await?;
        if fields.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        decode_task(&fields)
    }

    async fn list(&self) -> Result<Vec<TaskSummary>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ids: Vec<String> = redis::cmd("LRANGE")
            .arg(self.index_key())
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.cmd("HGETALL").arg(self.task_key(id));
        }
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        // A row can vanish between LRANGE and HGETALL if deleted concurrently.
        rows.iter()
            .filter(|fields| !fields.is_empty())
            .map(decode_summary)
            .collect()
    }

    async fn update_state(&self, id: &str, state: TaskState) -> Result<(), StoreError> {
        self.update_field(id, "state", state.code().to_string()).await
    }

    async fn update_end_time(&self, id: &str, end_time: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_field(id, "end_time", encode_time(Some(end_time))).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let deleted: i32 = self.delete_script
            .key(self.task_key(id))
            .key(self.index_key())
            .arg(id)
            .invoke_async(&mut conn)
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
