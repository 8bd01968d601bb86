use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use recordreplay::config::{Config, StoreConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Record and replay workloads across a cluster", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Redis connection URL; overrides the configured task store
    /// (defaults to redis://127.0.0.1:6379/0 when no config file is given)
    #[arg(long, global = true)]
    redis: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task and start recording on every up instance
    Record {
        /// Workload name
        #[arg(long, short)]
        name: String,

        /// Recording start as unix seconds (defaults to now)
        #[arg(long, short)]
        time: Option<i64>,
    },
    /// List all tasks
    List,
    /// Show one task
    Get { id: String },
    /// Stop recording
    Stop { id: String },
    /// Replay the recorded window; blocks for its full length
    Replay { id: String },
    /// Delete a task
    Delete { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ack() -> Result<()> {
    print_json(&serde_json::json!({}))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = Config::resolve(cli.config.as_deref(), cli.redis.as_deref())?;
    if config.store == StoreConfig::Memory {
        info!("Using in-memory task store; tasks will not outlive this process");
    }

    let orchestrator = config.build_orchestrator()?;

    match cli.command {
        Commands::Record { name, time } => {
            let start_time = match time {
                Some(secs) => DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| anyhow::anyhow!("invalid unix time: {}", secs))?,
                None => Utc::now(),
            };
            let task = orchestrator.start_record(&name, start_time).await?;
            print_json(&task)?;
        }
        Commands::List => print_json(&orchestrator.list_tasks().await?)?,
        Commands::Get { id } => print_json(&orchestrator.get_task(&id).await?)?,
        Commands::Stop { id } => {
            orchestrator.stop_record(&id).await?;
            ack()?;
        }
        Commands::Replay { id } => {
            orchestrator.start_replay(&id).await?;
            ack()?;
        }
        Commands::Delete { id } => {
            orchestrator.delete_task(&id).await?;
            ack()?;
        }
    }

    Ok(())
}
