use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
}

/// One `<source_dir> <target_dir>` line from the config file.
#[derive(Debug, Clone)]
pub struct ConfigPair {
    pub source: String,
    pub target: String,
}

/// Parse the FSS config file. Blank/whitespace-only lines are skipped;
/// malformed lines are reported to stderr and skipped rather than aborting
/// startup. Malformed lines are reported and skipped.
pub fn parse_config(path: &Path) -> Result<Vec<ConfigPair>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut pairs = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(source), Some(target)) => pairs.push(ConfigPair {
                source: source.to_string(),
                target: target.to_string(),
            }),
            _ => eprintln!("Invalid config line: {line}"),
        }
    }
    Ok(pairs)
}
