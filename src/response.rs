//! Assembling a command's response out of raw transport reads.
//!
//! Server output does not line up with read boundaries: one read may hold several protocol
//! lines, and one line may be spread over several reads. Instead of framing lines, the assembler
//! stores every chunk as it arrives and watches the accumulated text for the command's tagged
//! completion (`<tag> OK`, `<tag> NO` or `<tag> BAD`).

use std::io::{ErrorKind, Read};

use lazy_static::lazy_static;
use regex::bytes::Regex;
use tracing::trace;

use crate::error::{Error, ProtocolFailure, Result};
use crate::types::Command;

/// The most bytes a single transport read asks for.
pub const READ_BUFFER_SIZE: usize = 1024;

/// One transport read, after continuation normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseUnit {
    data: Vec<u8>,
    continuation: bool,
}

impl ResponseUnit {
    /// Builds a unit from a raw chunk. A leading `+` continuation marker is stripped.
    pub fn from_chunk(chunk: &[u8]) -> Self {
        match chunk.split_first() {
            Some((b'+', rest)) => ResponseUnit {
                data: rest.to_vec(),
                continuation: true,
            },
            _ => ResponseUnit {
                data: chunk.to_vec(),
                continuation: false,
            },
        }
    }

    /// The stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether the chunk began with a `+` continuation marker.
    pub fn is_continuation(&self) -> bool {
        self.continuation
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for ResponseUnit {
    fn from(data: Vec<u8>) -> Self {
        ResponseUnit {
            data,
            continuation: false,
        }
    }
}

/// How the server completed a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedOutcome {
    /// `<tag> OK`
    Success,
    /// `<tag> NO` or `<tag> BAD`
    Failure(ProtocolFailure),
}

/// Everything the server sent for one command, up to and including its tagged completion.
#[derive(Debug)]
pub struct TaggedResponse {
    /// Response units in arrival order.
    pub units: Vec<ResponseUnit>,
    pub outcome: TaggedOutcome,
}

impl TaggedResponse {
    /// Returns the units of a successful command. A failed command's units are discarded and the
    /// failure is surfaced as [`Error::Protocol`].
    pub fn into_result(self) -> Result<Vec<ResponseUnit>> {
        match self.outcome {
            TaggedOutcome::Success => Ok(self.units),
            TaggedOutcome::Failure(kind) => Err(Error::Protocol(kind)),
        }
    }
}

/// Reads from `stream` until the tagged completion of `command` has been seen.
///
/// Reads block for as long as the underlying transport does. A read that returns no data fails
/// with [`Error::ConnectionLost`]; any other I/O failure is returned as [`Error::Io`].
pub fn read_until_tagged<R: Read>(stream: &mut R, command: Command) -> Result<TaggedResponse> {
    let tag = command.tag();
    let ok = format!("{} OK", tag).into_bytes();
    let no = format!("{} NO", tag).into_bytes();
    let bad = format!("{} BAD", tag).into_bytes();
    // enough of the previous units to catch a completion split across two reads
    let lookback = bad.len() - 1;

    let mut units = Vec::new();
    let mut tail = Vec::with_capacity(lookback + READ_BUFFER_SIZE);
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let read = match stream.read(&mut buf) {
            Ok(0) => return Err(Error::ConnectionLost),
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        };

        let unit = ResponseUnit::from_chunk(&buf[..read]);
        trace!("S: {}", String::from_utf8_lossy(unit.as_bytes()).trim_end());

        tail.extend_from_slice(unit.as_bytes());
        let outcome = if contains(&tail, &ok) {
            Some(TaggedOutcome::Success)
        } else if contains(&tail, &no) || contains(&tail, &bad) {
            Some(TaggedOutcome::Failure(command.failure()))
        } else {
            None
        };
        let keep_from = tail.len().saturating_sub(lookback);
        tail.drain(..keep_from);

        units.push(unit);
        if let Some(outcome) = outcome {
            return Ok(TaggedResponse { units, outcome });
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    crate::utils::find(haystack, needle).is_some()
}

/// Joins response units into a single buffer, byte for byte and in order.
pub fn concatenate(units: &[ResponseUnit]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(units.iter().map(ResponseUnit::len).sum());
    for unit in units {
        buffer.extend_from_slice(unit.as_bytes());
    }
    buffer
}

lazy_static! {
    static ref LITERAL: Regex = Regex::new(r"\{(\d+)\}\r\n").unwrap();
}

/// Returns the content of the first literal (`{n}\r\n` followed by `n` bytes) in `buffer`.
///
/// A literal that claims more bytes than the buffer holds is cut short at the end of the buffer.
pub fn extract_literal(buffer: &[u8]) -> Option<&[u8]> {
    let caps = LITERAL.captures(buffer)?;
    let len: usize = std::str::from_utf8(caps.get(1)?.as_bytes())
        .ok()?
        .parse()
        .ok()?;
    let start = caps.get(0)?.end();
    let end = start.saturating_add(len).min(buffer.len());
    Some(&buffer[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_stream::MockStream;

    #[test]
    fn fetch_completes_in_arrival_order() {
        let chunks = ["* 1 FETCH ...\r\n", "A03 OK Fetch completed\r\n"];
        let mut stream = MockStream::from_chunks(chunks.iter().map(|c| c.as_bytes()));
        let response = read_until_tagged(&mut stream, Command::Fetch).unwrap();
        assert_eq!(response.outcome, TaggedOutcome::Success);
        let units: Vec<_> = response.units.iter().map(|u| u.as_bytes()).collect();
        assert_eq!(units, vec![chunks[0].as_bytes(), chunks[1].as_bytes()]);
    }

    #[test]
    fn select_no_is_folder_not_found() {
        let mut stream = MockStream::new(b"A02 NO Folder not found\r\n".to_vec());
        let response = read_until_tagged(&mut stream, Command::Select).unwrap();
        assert_eq!(
            response.outcome,
            TaggedOutcome::Failure(ProtocolFailure::FolderNotFound)
        );
        match response.into_result() {
            Err(Error::Protocol(ProtocolFailure::FolderNotFound)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn login_bad_is_auth_failure() {
        let mut stream = MockStream::new(b"A01 BAD [AUTHENTICATIONFAILED] no\r\n".to_vec());
        let response = read_until_tagged(&mut stream, Command::Login).unwrap();
        assert_eq!(
            response.outcome,
            TaggedOutcome::Failure(ProtocolFailure::AuthFailed)
        );
    }

    #[test]
    fn completion_split_across_reads() {
        let mut stream = MockStream::from_chunks(vec![
            &b"* 1 FETCH (BODY[] {3}\r\nfoo)\r\nA0"[..],
            &b"3 O"[..],
            &b"K done\r\n"[..],
        ]);
        let response = read_until_tagged(&mut stream, Command::Fetch).unwrap();
        assert_eq!(response.outcome, TaggedOutcome::Success);
        assert_eq!(response.units.len(), 3);
    }

    #[test]
    fn byte_at_a_time() {
        let text = b"* OK still here\r\nA04 OK done\r\n";
        let mut stream = MockStream::new(text.to_vec()).with_delay(text.len());
        let response = read_until_tagged(&mut stream, Command::FetchHeaders).unwrap();
        assert_eq!(response.outcome, TaggedOutcome::Success);
        // reading stops as soon as the completion is recognised
        let end = text.windows(6).position(|w| w == b"A04 OK").unwrap() + 6;
        assert_eq!(response.units.len(), end);
        assert_eq!(&concatenate(&response.units)[..], &text[..end]);
    }

    #[test]
    fn other_tags_do_not_complete() {
        let mut stream =
            MockStream::from_chunks(vec![&b"A02 OK stale\r\n"[..], &b"A03 NO nope\r\n"[..]]);
        let response = read_until_tagged(&mut stream, Command::Fetch).unwrap();
        assert_eq!(
            response.outcome,
            TaggedOutcome::Failure(ProtocolFailure::MessageNotFound)
        );
        assert_eq!(response.units.len(), 2);
    }

    #[test]
    fn continuation_marker_is_stripped() {
        let mut stream =
            MockStream::from_chunks(vec![&b"+ go ahead\r\n"[..], &b"A01 OK hi\r\n"[..]]);
        let response = read_until_tagged(&mut stream, Command::Login).unwrap();
        assert!(response.units[0].is_continuation());
        assert_eq!(response.units[0].as_bytes(), b" go ahead\r\n");
        assert!(!response.units[1].is_continuation());
    }

    #[test]
    fn eof_is_connection_lost() {
        let mut stream = MockStream::new(b"* 1 FETCH".to_vec()).with_eof();
        match read_until_tagged(&mut stream, Command::Fetch) {
            Err(Error::ConnectionLost) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn read_error_is_io() {
        let mut stream = MockStream::default().with_err();
        match read_until_tagged(&mut stream, Command::Fetch) {
            Err(Error::Io(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn concatenate_preserves_every_byte() {
        let units: Vec<ResponseUnit> = vec![
            b"abc".to_vec().into(),
            Vec::new().into(),
            b"\r\n".to_vec().into(),
            ResponseUnit::from_chunk(b"+"),
            b"xyz".to_vec().into(),
        ];
        let buffer = concatenate(&units);
        assert_eq!(buffer.len(), units.iter().map(|u| u.len()).sum::<usize>());
        assert_eq!(buffer, b"abc\r\nxyz");
        assert!(concatenate(&[]).is_empty());
    }

    #[test]
    fn literal() {
        let buffer = b"* 1 FETCH (BODY[] {5}\r\nhello)\r\nA03 OK done\r\n";
        assert_eq!(extract_literal(buffer), Some(&b"hello"[..]));
        assert_eq!(extract_literal(b"* 1 FETCH (BODY[] {50}\r\nshort"), Some(&b"short"[..]));
        assert_eq!(extract_literal(b"A03 OK done\r\n"), None);
    }
}
