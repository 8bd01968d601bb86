pub mod clock;
pub mod task;
pub mod dispatcher;
pub mod orchestrator;
pub mod storage;
pub mod redis_storage;
