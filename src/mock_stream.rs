use std::cmp::min;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Read, Result, Write};

/// An in-memory transport. Reads hand out the queued chunks one at a time, so tests control
/// exactly where the server's bytes are split.
#[derive(Default)]
pub struct MockStream {
    chunks: VecDeque<Vec<u8>>,
    pub written_buf: Vec<u8>,
    err_on_read: bool,
    eof_on_read: bool,
    read_delay: usize,
}

impl MockStream {
    pub fn new(read_buf: Vec<u8>) -> MockStream {
        MockStream::default().with_buf(read_buf)
    }

    /// Queue each element as the result of one `read` call.
    pub fn from_chunks<I, C>(chunks: I) -> MockStream
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        MockStream {
            chunks: chunks.into_iter().map(Into::into).collect(),
            ..MockStream::default()
        }
    }

    pub fn with_buf(mut self, read_buf: Vec<u8>) -> MockStream {
        self.chunks.push_back(read_buf);
        self
    }

    pub fn with_eof(mut self) -> MockStream {
        self.eof_on_read = true;
        self
    }

    pub fn with_err(mut self) -> MockStream {
        self.err_on_read = true;
        self
    }

    /// The next `n` reads return a single byte each.
    pub fn with_delay(mut self, n: usize) -> MockStream {
        self.read_delay = n;
        self
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.err_on_read {
            return Err(Error::new(ErrorKind::Other, "MockStream Error"));
        }
        while self.chunks.front().map_or(false, |c| c.is_empty()) {
            self.chunks.pop_front();
        }
        let chunk = match self.chunks.front_mut() {
            Some(chunk) => chunk,
            None if self.eof_on_read => return Ok(0),
            None => return Err(Error::new(ErrorKind::UnexpectedEof, "EOF")),
        };
        let mut write_len = min(buf.len(), chunk.len());
        if self.read_delay > 0 {
            self.read_delay -= 1;
            write_len = min(write_len, 1);
        }
        buf[..write_len].copy_from_slice(&chunk[..write_len]);
        chunk.drain(..write_len);
        Ok(write_len)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written_buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
