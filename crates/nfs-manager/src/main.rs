//! Thread-pool-driven manager for mirroring directories between remote
//! data-node daemons. Parses the sync-pair config, enumerates and enqueues
//! every configured pair's files, spins up a fixed worker pool to drain the
//! task queue over the wire protocol, and serves `add`/`cancel`/`shutdown`
//! on a TCP console port.

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nfs_manager::error::ManagerError;
use nfs_manager::registry::Pair;
use nfs_manager::{config, dispatcher, ManagerState, Queue, Registry, WorkerPool};

#[derive(Parser, Debug)]
#[command(name = "nfs-manager")]
struct Args {
    /// Path to the manager's domain log (truncated at startup).
    #[arg(short = 'l', long = "logfile")]
    logfile: PathBuf,

    /// Path to the sync-pair config file (`<dir>@<host>:<port> <dir>@<host>:<port>` per line).
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// TCP port the console protocol listens on.
    #[arg(short = 'p', long = "port")]
    port: u16,

    /// Capacity of the bounded task queue.
    #[arg(short = 'b', long = "buffer-size")]
    buffer_size: usize,

    /// Number of worker threads draining the task queue.
    #[arg(short = 'n', long = "workers", default_value_t = 5)]
    workers: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.buffer_size > 0, "buffer size must be a positive integer");
    anyhow::ensure!(args.workers > 0, "worker count must be a positive integer");

    let logger = Arc::new(
        sync_common::Logger::open(&args.logfile)
            .with_context(|| format!("failed to open log file {}", args.logfile.display()))?,
    );

    let registry = Arc::new(Registry::new());
    let queue = Arc::new(Queue::new(args.buffer_size));

    let config_pairs = config::parse_config(&args.config)
        .with_context(|| format!("failed to parse config file {}", args.config.display()))?;

    for config_pair in config_pairs {
        std::fs::create_dir_all(&config_pair.target.dir)
            .with_context(|| format!("failed to create target directory {}", config_pair.target.dir))?;
        let pair = Pair::new(config_pair.source, config_pair.target);
        registry.insert(pair.clone());
        if let Err(e) = dispatcher::enumerate_and_enqueue(&pair, &queue) {
            tracing::warn!(source = %pair.source_dir, error = %e, "initial enumeration failed");
        }
    }

    let pool = WorkerPool::spawn(args.workers, Arc::clone(&queue), Arc::clone(&registry), Arc::clone(&logger));

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .map_err(|source| ManagerError::Bind { port: args.port, source })
        .context("failed to start console listener")?;
    tracing::info!(port = args.port, workers = args.workers, "nfs-manager ready");

    let state = ManagerState { registry, queue: Arc::clone(&queue), logger };
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept console connection");
                continue;
            }
        };
        if dispatcher::handle_session(stream, &state) {
            break;
        }
    }

    pool.join();
    Ok(())
}
