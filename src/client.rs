use std::io::{BufRead, Read, Write};
use std::time::Duration;

use bufstream::BufStream;
use tracing::{debug, trace};

use super::conn::{Connection, SetReadTimeout};
use super::error::{Error, ProtocolFailure, Result, ValidateError};
use super::headers::HeaderFields;
use super::response::{self, concatenate, extract_literal, ResponseUnit};
use super::subjects::SubjectIndex;
use super::types::{Command, MessageSelector};

const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

/// The mailbox selected when no folder is given.
pub const DEFAULT_MAILBOX: &str = "INBOX";

macro_rules! quote {
    ($x:expr) => {
        format!("\"{}\"", $x.replace(r"\", r"\\").replace("\"", "\\\""))
    };
}

fn validate_str(value: &str) -> Result<String> {
    let quoted = quote!(value);
    validate_line(&quoted)?;
    Ok(quoted)
}

/// Rejects values that would end the command line early.
fn validate_line(value: &str) -> Result<&str> {
    if value.contains('\n') {
        return Err(Error::Validate(ValidateError('\n')));
    }
    if value.contains('\r') {
        return Err(Error::Validate(ValidateError('\r')));
    }
    Ok(value)
}

/// A connection to an IMAP server, driving one command at a time.
///
/// Every command is written and then its response is drained up to the tagged completion before
/// the method returns, so there is never more than one command outstanding.
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
}

impl Client<Connection> {
    /// Sets the timeout for reads on the underlying transport. `None` blocks indefinitely.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.get_mut().set_read_timeout(timeout)
    }
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client with the underlying stream.
    ///
    /// The server greeting has not been read yet; see [`Client::read_greeting`].
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
        }
    }

    /// Reads and discards the server greeting line.
    pub fn read_greeting(&mut self) -> Result<()> {
        let mut v = Vec::new();
        self.readline(&mut v)?;
        Ok(())
    }

    /// Log in to the IMAP server.
    ///
    /// A `NO` or `BAD` completion fails with [`ProtocolFailure::AuthFailed`].
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = format!(
            "LOGIN {} {}",
            validate_line(username)?,
            validate_line(password)?
        );
        self.run_command_and_check_ok(Command::Login, &command)
    }

    /// Selects a mailbox. An empty name selects [`DEFAULT_MAILBOX`].
    ///
    /// A `NO` or `BAD` completion fails with [`ProtocolFailure::FolderNotFound`].
    pub fn select(&mut self, mailbox_name: &str) -> Result<()> {
        let mailbox_name = if mailbox_name.is_empty() {
            DEFAULT_MAILBOX
        } else {
            mailbox_name
        };
        self.run_command_and_check_ok(
            Command::Select,
            &format!("SELECT {}", validate_str(mailbox_name)?),
        )
    }

    /// Fetches the full message without setting `\Seen`, returning the response units exactly as
    /// they were read.
    pub fn fetch(&mut self, message: MessageSelector) -> Result<Vec<ResponseUnit>> {
        self.run_command_and_read_response(
            Command::Fetch,
            &format!("FETCH {} BODY.PEEK[]", message),
        )
    }

    /// Fetches the full message and returns just its raw bytes.
    ///
    /// A successful completion that carries no message literal fails with
    /// [`ProtocolFailure::MessageNotFound`].
    pub fn fetch_raw(&mut self, message: MessageSelector) -> Result<Vec<u8>> {
        let buffer = concatenate(&self.fetch(message)?);
        extract_literal(&buffer)
            .map(<[u8]>::to_vec)
            .ok_or(Error::Protocol(ProtocolFailure::MessageNotFound))
    }

    /// Fetches the `From`, `To`, `Date` and `Subject` headers of a message.
    pub fn fetch_header_fields(&mut self, message: MessageSelector) -> Result<HeaderFields> {
        let units = self.run_command_and_read_response(
            Command::FetchHeaders,
            &format!(
                "FETCH {} BODY.PEEK[HEADER.FIELDS (FROM TO DATE SUBJECT)]",
                message
            ),
        )?;
        let buffer = concatenate(&units);
        let headers = extract_literal(&buffer).unwrap_or(&buffer);
        Ok(HeaderFields::parse(&String::from_utf8_lossy(headers)))
    }

    /// Fetches the subject of every message in the selected mailbox.
    pub fn fetch_subjects(&mut self) -> Result<SubjectIndex> {
        let units = self.run_command_and_read_response(
            Command::FetchSubjects,
            "FETCH 1:* (BODY[HEADER.FIELDS (SUBJECT)])",
        )?;
        let buffer = concatenate(&units);
        Ok(SubjectIndex::parse(&String::from_utf8_lossy(&buffer)))
    }

    /// Runs a command and checks if it returns OK.
    pub fn run_command_and_check_ok(&mut self, command: Command, untagged: &str) -> Result<()> {
        self.run_command_and_read_response(command, untagged)
            .map(|_| ())
    }

    /// Runs a command and returns everything the server sent for it, in arrival order.
    pub fn run_command_and_read_response(
        &mut self,
        command: Command,
        untagged: &str,
    ) -> Result<Vec<ResponseUnit>> {
        self.run_command(command, untagged)?;
        self.read_response(command)
    }

    /// Sends `untagged` prefixed with the tag of `command`.
    pub fn run_command(&mut self, command: Command, untagged: &str) -> Result<()> {
        let line = format!("{} {}", command.tag(), untagged);
        if command == Command::Login {
            trace!("C: {} LOGIN ****", command.tag());
        } else {
            trace!("C: {}", line);
        }
        self.write_line(line.as_bytes())
    }

    fn read_response(&mut self, command: Command) -> Result<Vec<ResponseUnit>> {
        let response = response::read_until_tagged(&mut self.stream, command)?;
        debug!(
            "{} completed with {:?} after {} reads",
            command.tag(),
            response.outcome,
            response.units.len()
        );
        response.into_result()
    }

    fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        let len = into.len();
        let line = &into[(len - read)..];
        trace!("S: {}", String::from_utf8_lossy(line).trim_end());

        Ok(read)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        Ok(())
    }

    /// Returns the underlying stream, flushing anything still buffered for writing.
    pub fn into_inner(self) -> Result<T> {
        Ok(self.stream.into_inner()?)
    }
}
