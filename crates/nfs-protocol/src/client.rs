//! Manager-worker side of the protocol: issuing `LIST`/`PULL`/`PUSH`
//! requests against a data node and parsing the responses. Used by
//! `nfs-manager`.

use std::io::{BufRead, BufReader, Read, Write};

use crate::framing::{read_token, token_to_string};
use crate::{ProtocolError, MAX_CHUNK_SIZE};

/// Ask a data node to list a directory. Consumes the connection: a fresh
/// connection is expected for each call.
pub fn list_dir(stream: impl Read + Write, dir: &str) -> Result<Vec<String>, ProtocolError> {
    let mut stream = stream;
    write!(stream, "LIST {dir}\n")?;
    let mut reader = BufReader::new(stream);

    let mut entries = Vec::new();
    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Err(ProtocolError::Malformed(
                "connection closed before LIST terminator".into(),
            ));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "." {
            return Ok(entries);
        }
        entries.push(trimmed.to_string());
    }
}

/// Pull a file's contents from a data node. Consumes the connection.
pub fn pull(stream: impl Read + Write, path: &str) -> Result<Vec<u8>, ProtocolError> {
    let mut stream = stream;
    write!(stream, "PULL {path}\n")?;
    let mut reader = BufReader::new(stream);

    let (size_token, term) = read_token(&mut reader)?
        .ok_or_else(|| ProtocolError::Malformed("connection closed before PULL size".into()))?;
    if term != b' ' {
        return Err(ProtocolError::Malformed(
            "PULL size header must be followed by a space".into(),
        ));
    }
    let size_str = token_to_string(size_token);
    let size: i64 = size_str
        .parse()
        .map_err(|_| ProtocolError::Malformed(format!("PULL size {size_str:?} is not an integer")))?;

    if size < 0 {
        let mut reason = String::new();
        reader.read_line(&mut reason)?;
        return Err(ProtocolError::Remote(reason.trim_end().to_string()));
    }

    let mut data = vec![0u8; size as usize];
    reader.read_exact(&mut data)?;
    Ok(data)
}

/// Push `data` to a data node at `path`, in chunks of at most
/// `chunk_size` bytes (capped at [`MAX_CHUNK_SIZE`]). Consumes the
/// connection. Returns the number of bytes pushed.
pub fn push(
    stream: impl Read + Write,
    path: &str,
    data: &[u8],
    chunk_size: usize,
) -> Result<usize, ProtocolError> {
    let mut stream = stream;
    let chunk_size = chunk_size.min(MAX_CHUNK_SIZE).max(1);

    write!(stream, "PUSH {path} -1\n")?;

    let mut sent = 0usize;
    for chunk in data.chunks(chunk_size) {
        let mut frame = format!("PUSH {path} {} ", chunk.len()).into_bytes();
        frame.extend_from_slice(chunk);
        // One write call for header + payload together: splitting these
        // risks another pipelined request interleaving.
        stream.write_all(&frame)?;
        sent += chunk.len();
    }

    write!(stream, "PUSH {path} 0\n")?;
    Ok(sent)
}
