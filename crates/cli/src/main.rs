//! drainq CLI - push to and drain queues from the command line

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use drainq_core::port::{ExtractCommand, QueueClient, QueueWriter};
use drainq_core::{FetchContext, QueueFetcher, QueueProducer};
use drainq_infra_redis::{CountedPopCommand, RedisQueue};
use drainq_infra_sqlite::SqliteQueue;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_SQLITE_URL: &str = "sqlite://drainq.db";

#[derive(Parser)]
#[command(name = "drainq")]
#[command(about = "Push to and drain FIFO work queues", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backing store
    #[arg(long, value_enum, env = "DRAINQ_BACKEND", default_value = "redis")]
    backend: BackendKind,

    /// Store URL (defaults depend on the backend)
    #[arg(long, env = "DRAINQ_URL")]
    url: Option<String>,

    /// Log format: pretty or json
    #[arg(long, env = "DRAINQ_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Redis,
    Sqlite,
}

#[derive(Subcommand)]
enum Commands {
    /// Push JSON documents to the tail of a queue
    Push {
        /// Queue key
        #[arg(short, long)]
        key: String,

        /// Push strings verbatim instead of validating them as JSON
        #[arg(long)]
        raw: bool,

        /// Documents to push (one per line on stdin when omitted)
        values: Vec<String>,
    },

    /// Drain one batch and print each document on its own line
    Fetch {
        /// Queue key
        #[arg(short, long)]
        key: String,

        /// Maximum documents per fetch (0 = default of 1000)
        #[arg(short, long, env = "DRAINQ_BATCH_SIZE", default_value = "0")]
        batch_size: usize,

        /// Abort the round trip after this many milliseconds
        #[arg(long, env = "DRAINQ_TIMEOUT_MS")]
        timeout_ms: Option<u64>,

        /// Use native LPOP with count instead of the Lua pop loop (Redis only)
        #[arg(long)]
        native_pop: bool,
    },

    /// Show queue lengths
    Len {
        /// Queue keys
        #[arg(short, long, required = true)]
        key: Vec<String>,
    },
}

#[derive(Tabled)]
struct QueueLength {
    queue: String,
    length: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_format)?;

    info!("drainq v{} starting...", drainq_core::VERSION);
    validate_flags(&cli)?;

    match cli.backend {
        BackendKind::Redis => {
            let url = cli.url.as_deref().unwrap_or(DEFAULT_REDIS_URL);
            let queue = drainq_infra_redis::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?;

            let command = native_pop(&cli.command)
                .then(|| Arc::new(CountedPopCommand) as Arc<dyn ExtractCommand<RedisQueue>>);
            run(queue, cli.command, command).await
        }
        BackendKind::Sqlite => {
            let url = cli.url.as_deref().unwrap_or(DEFAULT_SQLITE_URL);
            let queue = SqliteQueue::open(url)
                .await
                .with_context(|| format!("Failed to open SQLite queue at {}", url))?;

            run(queue, cli.command, None).await
        }
    }
}

fn native_pop(command: &Commands) -> bool {
    matches!(command, Commands::Fetch { native_pop: true, .. })
}

/// Reject flag combinations before any store is opened or created
fn validate_flags(cli: &Cli) -> Result<()> {
    if native_pop(&cli.command) && matches!(cli.backend, BackendKind::Sqlite) {
        anyhow::bail!("--native-pop is only available with the Redis backend");
    }
    Ok(())
}

async fn run<C>(
    client: C,
    command: Commands,
    extract_command: Option<Arc<dyn ExtractCommand<C>>>,
) -> Result<()>
where
    C: QueueClient + QueueWriter,
{
    match command {
        Commands::Push { key, raw, values } => {
            let values = if values.is_empty() {
                read_stdin_lines().await?
            } else {
                values
            };

            let len = push_values(client, &key, raw, &values).await?;

            eprintln!(
                "{}",
                format!("✓ Pushed {} entries to {} (length {})", values.len(), key, len)
                    .green()
                    .bold()
            );
        }

        Commands::Fetch {
            key,
            batch_size,
            timeout_ms,
            ..
        } => {
            let mut builder = QueueFetcher::<Value, C>::builder()
                .client(client)
                .batch_size(batch_size);
            if let Some(command) = extract_command {
                builder = builder.shared_extract_command(command);
            }
            let fetcher = builder.build_json()?;

            let mut ctx = FetchContext::background();
            if let Some(ms) = timeout_ms {
                ctx = ctx.with_timeout(Duration::from_millis(ms));
            }

            let batch = fetcher.fetch_batch(&ctx, &[key.clone()]).await?;
            for item in &batch.items {
                println!("{}", serde_json::to_string(item)?);
            }

            let summary = format!(
                "✓ Fetched {} of {} popped entries from {}",
                batch.items.len(),
                batch.popped,
                key
            );
            eprintln!("{}", summary.green().bold());
            if batch.skipped > 0 {
                eprintln!(
                    "{}",
                    format!("  {} undecodable entries dropped", batch.skipped).yellow()
                );
            }
        }

        Commands::Len { key } => {
            let mut rows = Vec::with_capacity(key.len());
            for queue in key {
                let length = client.len(&queue).await?;
                rows.push(QueueLength { queue, length });
            }
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

async fn push_values<C: QueueWriter>(
    client: C,
    key: &str,
    raw: bool,
    values: &[String],
) -> Result<usize> {
    if raw {
        return Ok(client.push(key, values).await?);
    }

    let documents = values
        .iter()
        .map(|v| serde_json::from_str::<Value>(v))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Invalid JSON payload")?;
    Ok(QueueProducer::<Value, _>::json(client)
        .push(key, &documents)
        .await?)
}

async fn read_stdin_lines() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut values = Vec::new();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if !line.trim().is_empty() {
            values.push(line);
        }
    }
    Ok(values)
}
