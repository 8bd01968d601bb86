pub mod channel;
pub mod config;
pub mod error;
pub mod runtime;
pub mod topology;
