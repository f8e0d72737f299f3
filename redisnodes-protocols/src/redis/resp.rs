//! RESP framing for the `CLUSTER NODES` exchange
//!
//! The tool sends exactly one command and expects exactly one textual reply, so
//! only the reply types Redis may answer `CLUSTER NODES` with are decoded:
//! bulk strings (RESP2), verbatim strings (RESP3), simple strings, and the two
//! error forms.

use anyhow::{anyhow, bail, Result};

/// RESP-encoded `CLUSTER NODES` command: `*2\r\n$7\r\nCLUSTER\r\n$5\r\nNODES\r\n`
///
/// ```
/// use redisnodes_protocols::cluster_nodes_command;
///
/// assert_eq!(cluster_nodes_command(), b"*2\r\n$7\r\nCLUSTER\r\n$5\r\nNODES\r\n");
/// ```
pub fn cluster_nodes_command() -> Vec<u8> {
    b"*2\r\n$7\r\nCLUSTER\r\n$5\r\nNODES\r\n".to_vec()
}

/// Find the end of the first complete RESP reply in `data`
///
/// Returns the number of bytes the reply occupies, or 0 when more data is
/// needed.
pub fn find_reply_end(data: &[u8]) -> Result<usize> {
    if data.is_empty() {
        return Ok(0);
    }

    let Some(first_crlf) = find_crlf(data) else {
        return Ok(0); // Incomplete
    };

    match data[0] {
        // Simple strings, errors, integers end with the first \r\n
        b'+' | b'-' | b':' => Ok(first_crlf + 2),
        // Bulk string ($), blob error (!), verbatim string (=)
        b'$' | b'!' | b'=' => {
            let length = parse_length(&data[1..first_crlf])?;
            if length == -1 {
                // Null bulk string
                return Ok(first_crlf + 2);
            }
            if length < 0 {
                bail!("Invalid negative bulk string length: {}", length);
            }

            let expected_total = first_crlf + 2 + length as usize + 2;
            if data.len() >= expected_total {
                Ok(expected_total)
            } else {
                Ok(0) // Incomplete
            }
        }
        other => Err(anyhow!("Unexpected RESP reply type '{}'", other as char)),
    }
}

/// Decode one complete textual RESP reply
///
/// Error replies become `Err` carrying the server's message.
pub fn decode_text_reply(data: &[u8]) -> Result<String> {
    let end = find_reply_end(data)?;
    if end == 0 {
        bail!("Incomplete RESP reply ({} bytes buffered)", data.len());
    }

    let first_crlf = find_crlf(data).ok_or_else(|| anyhow!("Malformed RESP reply"))?;
    let header = &data[1..first_crlf];

    match data[0] {
        b'+' => Ok(utf8(header)?.to_string()),
        b'-' => Err(anyhow!("Redis error: {}", String::from_utf8_lossy(header))),
        b':' => Err(anyhow!("Expected a text reply, got integer {}", String::from_utf8_lossy(header))),
        b'$' | b'=' | b'!' => {
            if parse_length(header)? == -1 {
                bail!("Expected a text reply, got null");
            }
            let body = &data[first_crlf + 2..end - 2];

            match data[0] {
                b'!' => Err(anyhow!("Redis error: {}", String::from_utf8_lossy(body))),
                // Verbatim strings carry a three-letter format and a colon
                b'=' => {
                    let text = utf8(body)?;
                    match text.split_once(':') {
                        Some((format, rest)) if format.len() == 3 => Ok(rest.to_string()),
                        _ => bail!("Malformed verbatim string reply"),
                    }
                }
                _ => Ok(utf8(body)?.to_string()),
            }
        }
        other => Err(anyhow!("Unexpected RESP reply type '{}'", other as char)),
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

fn parse_length(raw: &[u8]) -> Result<i64> {
    let length_str =
        std::str::from_utf8(raw).map_err(|e| anyhow!("Invalid bulk string length: {e}"))?;
    length_str
        .parse()
        .map_err(|e| anyhow!("Failed to parse bulk string length '{length_str}': {e}"))
}

fn utf8(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|e| anyhow!("Invalid UTF-8 in reply: {e}"))
}
