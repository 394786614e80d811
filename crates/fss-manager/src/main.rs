//! Single-threaded event-driven supervisor for local filesystem mirroring.
//! Watches registered directories
//! for filesystem-change events, dispatches per-operation mirror jobs to
//! `fss-worker` child processes bounded by a configured concurrency
//! limit, queues overflow work, and mediates between administrator
//! commands arriving on the `fss_in` named pipe and the event loop.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tracing_subscriber::EnvFilter;

use fss_manager::error::FssError;
use fss_manager::supervisor::{Supervisor, SupervisorMsg};
use fss_manager::{config, watch};

const FSS_IN: &str = "fss_in";
const FSS_OUT: &str = "fss_out";

#[derive(Parser, Debug)]
#[command(name = "fss-manager")]
struct Args {
    /// Path to the manager's domain log (truncated at startup).
    #[arg(short = 'l', long = "logfile")]
    logfile: PathBuf,

    /// Path to the sync-pair config file (`<source_dir> <target_dir>` per line).
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Maximum number of concurrent mirror workers.
    #[arg(short = 'n', long = "workers", default_value_t = 5)]
    workers: usize,

    /// Path to the `fss-worker` binary to spawn per event.
    #[arg(long = "worker-bin", default_value = "fss-worker")]
    worker_bin: PathBuf,
}

fn create_named_pipes() -> Result<(), FssError> {
    for path in [FSS_IN, FSS_OUT] {
        let _ = std::fs::remove_file(path);
        mkfifo(path, Mode::from_bits_truncate(0o666)).map_err(|source| FssError::CreatePipe {
            path: path.to_string(),
            source,
        })?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    create_named_pipes().context("failed to create fss_in/fss_out named pipes")?;

    let logger = sync_common::Logger::open(&args.logfile)
        .with_context(|| format!("failed to open log file {}", args.logfile.display()))?;

    let config_pairs = config::parse_config(&args.config)
        .with_context(|| format!("failed to parse config file {}", args.config.display()))?
        .into_iter()
        .map(|p| (p.source, p.target))
        .collect::<Vec<_>>();

    let (tx, rx) = mpsc::channel::<SupervisorMsg>();

    let watcher = watch::spawn_watcher(tx.clone()).context("failed to start filesystem watcher")?;

    tracing::info!(path = FSS_IN, "opening admin command pipe");
    let fss_in = OpenOptions::new()
        .read(true)
        .open(FSS_IN)
        .map_err(|source| FssError::OpenPipe { path: FSS_IN.to_string(), source })
        .context("failed to open fss_in")?;

    tracing::info!(path = FSS_OUT, "opening admin response pipe");
    let fss_out = OpenOptions::new()
        .write(true)
        .open(FSS_OUT)
        .map_err(|source| FssError::OpenPipe { path: FSS_OUT.to_string(), source })
        .context("failed to open fss_out")?;

    // The admin-pipe reader is a pure producer: it forwards whole command
    // lines and never touches registry/backlog/child-table state itself.
    // A FIFO hits EOF once every writer closes it, so each console session
    // ending would otherwise stop this thread for good; reopen for the
    // next session instead, same as the original's close-then-reopen loop.
    let command_tx = tx.clone();
    thread::spawn(move || {
        let mut fss_in = fss_in;
        loop {
            let reader = BufReader::new(fss_in);
            for line in reader.lines().map_while(Result::ok) {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if command_tx.send(SupervisorMsg::Command(line)).is_err() {
                    return;
                }
            }

            fss_in = match OpenOptions::new().read(true).open(FSS_IN) {
                Ok(file) => file,
                Err(_) => return,
            };
        }
    });

    let mut supervisor = Supervisor::new(args.workers, logger, fss_out, watcher, args.worker_bin, tx);
    supervisor.bootstrap(config_pairs);

    tracing::info!(workers = args.workers, "fss-manager ready");
    supervisor.run(rx);

    Ok(())
}
