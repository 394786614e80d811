//! Server side of the data-node wire protocol: accepts connections and
//! serves LIST/PULL/PUSH against this host's local filesystem. One thread
//! per connection, each owning its own open-file handle for an in-progress
//! PUSH — unlike a single process-wide handle, two concurrent pushers can't
//! stomp on each other's writes.

use std::fs::{self, File};
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nfs_protocol::server::{read_request, write_list_response, write_pull_error, write_pull_response, PushFrame, Request};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum DataNodeError {
    #[error("failed to bind {addr}:{port}: {source}")]
    Bind { addr: String, port: u16, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "nfs-datanode")]
struct Args {
    /// Port to listen on.
    #[arg(short = 'p', long = "port")]
    port: u16,

    /// Address to bind to. Defaults to loopback only: this daemon has no
    /// authentication, so binding every interface by default would be a
    /// needless exposure.
    #[arg(short = 'b', long = "bind", default_value = "127.0.0.1")]
    bind: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let listener = TcpListener::bind((args.bind.as_str(), args.port))
        .map_err(|source| DataNodeError::Bind {
            addr: args.bind.clone(),
            port: args.port,
            source,
        })
        .with_context(|| format!("failed to start data node on {}:{}", args.bind, args.port))?;

    tracing::info!(addr = %args.bind, port = args.port, "nfs-datanode listening");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                std::thread::spawn(move || {
                    if let Err(e) = handle_connection(stream) {
                        tracing::warn!(error = %e, "connection ended with an error");
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream) -> std::io::Result<()> {
    let mut open_file: Option<File> = None;

    loop {
        let request = match read_request(&mut stream) {
            Ok(Some(req)) => req,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "malformed request, closing connection");
                return Ok(());
            }
        };

        match request {
            Request::List { dir } => handle_list(&mut stream, &dir)?,
            Request::Pull { path } => handle_pull(&mut stream, &path)?,
            Request::Push(frame) => handle_push(&mut open_file, frame)?,
        }
    }
}

fn handle_list(stream: &mut TcpStream, dir: &str) -> std::io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };
    write_list_response(stream, &entries)
}

fn handle_pull(stream: &mut TcpStream, path: &str) -> std::io::Result<()> {
    match fs::read(path) {
        Ok(data) => write_pull_response(stream, &data),
        Err(e) => write_pull_error(stream, &e.to_string()),
    }
}

fn handle_push(open_file: &mut Option<File>, frame: PushFrame) -> std::io::Result<()> {
    match frame {
        PushFrame::Open { path } => {
            if let Some(parent) = PathBuf::from(&path).parent() {
                fs::create_dir_all(parent)?;
            }
            *open_file = Some(File::create(path)?);
        }
        PushFrame::Chunk { path: _, data } => {
            if let Some(file) = open_file.as_mut() {
                file.write_all(&data)?;
            }
        }
        PushFrame::Close { path: _ } => {
            if let Some(file) = open_file.take() {
                file.sync_all()?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn handle_push_sequence_writes_concatenated_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt").to_string_lossy().into_owned();

        let mut open_file = None;
        handle_push(&mut open_file, PushFrame::Open { path: path.clone() }).unwrap();
        handle_push(&mut open_file, PushFrame::Chunk { path: path.clone(), data: b"hello ".to_vec() }).unwrap();
        handle_push(&mut open_file, PushFrame::Chunk { path: path.clone(), data: b"world".to_vec() }).unwrap();
        handle_push(&mut open_file, PushFrame::Close { path: path.clone() }).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn handle_push_open_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"stale content that is longer").unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let mut open_file = None;
        handle_push(&mut open_file, PushFrame::Open { path: path_str.clone() }).unwrap();
        handle_push(&mut open_file, PushFrame::Chunk { path: path_str.clone(), data: b"new".to_vec() }).unwrap();
        handle_push(&mut open_file, PushFrame::Close { path: path_str }).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn handle_list_missing_directory_returns_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope").to_string_lossy().into_owned();

        let entries = fs::read_dir(&missing);
        assert!(entries.is_err());
    }
}
