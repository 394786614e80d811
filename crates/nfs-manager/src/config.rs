use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("malformed config line {line:?}: {reason}")]
    Malformed { line: String, reason: String },
}

/// One `<dir>@<host>:<port>` endpoint, half of a configured pair.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub dir: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ConfigPair {
    pub source: Endpoint,
    pub target: Endpoint,
}

pub fn parse_endpoint(token: &str) -> Result<Endpoint, String> {
    let (dir, rest) = token
        .split_once('@')
        .ok_or_else(|| format!("{token:?} is missing '@host:port'"))?;
    let (host, port) = rest
        .split_once(':')
        .ok_or_else(|| format!("{token:?} is missing ':port'"))?;
    let port: u16 = port
        .parse()
        .map_err(|_| format!("{port:?} is not a valid port number"))?;
    Ok(Endpoint {
        dir: dir.to_string(),
        host: host.to_string(),
        port,
    })
}

/// Parse the NFS sync-pair config file: one `<dir>@<host>:<port>
/// <dir>@<host>:<port>` pair per line. Unlike the FSS config parser, a
/// malformed line aborts the whole parse rather than being skipped with a
/// warning — once sockets and worker threads are involved there is no good
/// way to run with a partially-loaded pair list.
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
        let (Some(src_token), Some(tgt_token)) = (tokens.next(), tokens.next()) else {
            return Err(ConfigError::Malformed {
                line: line.to_string(),
                reason: "expected two '<dir>@<host>:<port>' tokens".into(),
            });
        };
        let source = parse_endpoint(src_token).map_err(|reason| ConfigError::Malformed {
            line: line.to_string(),
            reason,
        })?;
        let target = parse_endpoint(tgt_token).map_err(|reason| ConfigError::Malformed {
            line: line.to_string(),
            reason,
        })?;
        pairs.push(ConfigPair { source, target });
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_valid_pairs_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nfs.conf");
        fs::write(&path, "/s@h1:1000 /t@h2:2000\n\n   \n").unwrap();

        let pairs = parse_config(&path).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source.dir, "/s");
        assert_eq!(pairs[0].source.host, "h1");
        assert_eq!(pairs[0].source.port, 1000);
        assert_eq!(pairs[0].target.port, 2000);
    }

    #[test]
    fn rejects_endpoint_missing_at_sign() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nfs.conf");
        fs::write(&path, "/s:1000 /t@h2:2000\n").unwrap();

        let err = parse_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nfs.conf");
        fs::write(&path, "/s@h1:notaport /t@h2:2000\n").unwrap();

        let err = parse_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
