use std::io::{self, Read};

/// Read bytes up to (and consuming) the next space or newline. `\r` is
/// tolerated and dropped so the protocol works over connections that
/// normalize line endings. Returns `Ok(None)` only on a clean EOF with no
/// bytes read at all (i.e. the peer closed the connection between
/// requests, which is the normal way a connection ends).
///
/// On EOF *mid*-token (the peer died while writing a token) the partial
/// token is returned with a terminator of `0`, which callers treat as a
/// protocol error rather than a clean end of stream.
pub(crate) fn read_token(reader: &mut impl Read) -> io::Result<Option<(Vec<u8>, u8)>> {
    let mut token = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte)? {
            0 => {
                if token.is_empty() {
                    return Ok(None);
                }
                return Ok(Some((token, 0)));
            }
            _ => {
                let b = byte[0];
                match b {
                    b' ' | b'\n' => return Ok(Some((token, b))),
                    b'\r' => continue,
                    _ => token.push(b),
                }
            }
        }
    }
}

pub(crate) fn token_to_string(token: Vec<u8>) -> String {
    String::from_utf8_lossy(&token).into_owned()
}
