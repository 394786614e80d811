//! Data-node side of the protocol: parsing incoming requests and writing
//! responses. Used by the `nfs-datanode` daemon.

use std::io::{self, Read, Write};

use crate::framing::{read_token, token_to_string};
use crate::ProtocolError;

/// A single PUSH frame: a PUSH sequence for a given path is
/// always `Open`, zero or more `Chunk`s, then `Close`.
#[derive(Debug, Clone)]
pub enum PushFrame {
    /// `PUSH <path> -1`: open-and-truncate.
    Open { path: String },
    /// `PUSH <path> <n>` with `n > 0`: exactly `n` raw payload bytes follow.
    Chunk { path: String, data: Vec<u8> },
    /// `PUSH <path> 0`: close.
    Close { path: String },
}

#[derive(Debug, Clone)]
pub enum Request {
    List { dir: String },
    Pull { path: String },
    Push(PushFrame),
}

/// Read the next request off `reader`. Returns `Ok(None)` when the
/// connection has ended cleanly between requests.
pub fn read_request(reader: &mut impl Read) -> Result<Option<Request>, ProtocolError> {
    let Some((command, term)) = read_token(reader)? else {
        return Ok(None);
    };
    if term != b' ' {
        return Err(ProtocolError::Malformed(
            "request command must be followed by an argument".into(),
        ));
    }
    let command = token_to_string(command);

    match command.as_str() {
        "LIST" => {
            let dir = read_rest_of_line(reader)?;
            Ok(Some(Request::List { dir }))
        }
        "PULL" => {
            let path = read_rest_of_line(reader)?;
            Ok(Some(Request::Pull { path }))
        }
        "PUSH" => Ok(Some(Request::Push(read_push_frame(reader)?))),
        other => Err(ProtocolError::Malformed(format!("unknown command {other}"))),
    }
}

fn read_rest_of_line(reader: &mut impl Read) -> Result<String, ProtocolError> {
    let (token, term) = read_token(reader)?
        .ok_or_else(|| ProtocolError::Malformed("request truncated before argument".into()))?;
    if term != b'\n' {
        return Err(ProtocolError::Malformed(
            "request argument must be the last token on the line".into(),
        ));
    }
    Ok(token_to_string(token))
}

fn read_push_frame(reader: &mut impl Read) -> Result<PushFrame, ProtocolError> {
    let (path_token, term) = read_token(reader)?
        .ok_or_else(|| ProtocolError::Malformed("PUSH truncated before path".into()))?;
    if term != b' ' {
        return Err(ProtocolError::Malformed("PUSH path must be followed by a size".into()));
    }
    let path = token_to_string(path_token);

    let (n_token, n_term) = read_token(reader)?
        .ok_or_else(|| ProtocolError::Malformed("PUSH truncated before size".into()))?;
    let n_str = token_to_string(n_token);
    let n: i64 = n_str
        .parse()
        .map_err(|_| ProtocolError::Malformed(format!("PUSH size {n_str:?} is not an integer")))?;

    match n_term {
        b'\n' => match n {
            -1 => Ok(PushFrame::Open { path }),
            0 => Ok(PushFrame::Close { path }),
            _ => Err(ProtocolError::Malformed(
                "PUSH without a trailing payload must use size -1 or 0".into(),
            )),
        },
        b' ' => {
            if n <= 0 {
                return Err(ProtocolError::Malformed(
                    "PUSH chunk size must be positive".into(),
                ));
            }
            let mut data = vec![0u8; n as usize];
            reader.read_exact(&mut data)?;
            Ok(PushFrame::Chunk { path, data })
        }
        _ => Err(ProtocolError::Malformed("PUSH size truncated mid-token".into())),
    }
}

/// Write a `LIST` response: each entry on its own line, terminated by a
/// line containing exactly `.`.
pub fn write_list_response(writer: &mut impl Write, entries: &[String]) -> io::Result<()> {
    for entry in entries {
        writeln!(writer, "{entry}")?;
    }
    writeln!(writer, ".")
}

/// Write a successful `PULL` response header followed by the file body.
pub fn write_pull_response(writer: &mut impl Write, data: &[u8]) -> io::Result<()> {
    write!(writer, "{} ", data.len())?;
    writer.write_all(data)?;
    writer.flush()
}

/// Write an error `PULL` response: `-1 <reason>\n`.
pub fn write_pull_error(writer: &mut impl Write, reason: &str) -> io::Result<()> {
    writeln!(writer, "-1 {reason}")
}
