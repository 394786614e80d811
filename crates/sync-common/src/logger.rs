use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;

use crate::{now_string, Report};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("failed to write log file: {0}")]
    Write(#[from] io::Error),
}

/// Append-only domain logger. Every write is flushed
/// immediately so no log entry is ever lost to buffering, and the file is
/// truncated once at manager startup via [`Logger::open`].
pub struct Logger {
    file: Mutex<File>,
}

impl Logger {
    /// Open (truncating) the log file for this manager run.
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| LogError::Open {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append a plain administrative line: `[YYYY-MM-DD HH:MM:SS] <message>`.
    pub fn log_message(&self, message: &str) -> Result<(), LogError> {
        self.append(&format!("[{}] {message}\n", now_string()))
    }

    /// Append a structured sync outcome:
    /// `[ts] [src] [tgt] [worker_id] [OPERATION] [RESULT] [details]`.
    pub fn log_report(&self, report: &Report) -> Result<(), LogError> {
        let details = if report.status == crate::Status::Error && !report.errors.is_empty() {
            &report.errors
        } else {
            &report.details
        };
        self.append(&format!(
            "[{}] [{}] [{}] [{}] [{}] [{}] [{}]\n",
            now_string(),
            report.source,
            report.target,
            report.worker_id,
            report.operation,
            report.status,
            details
        ))
    }

    fn append(&self, line: &str) -> Result<(), LogError> {
        let mut file = self.file.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
