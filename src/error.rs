//! IMAP error types.

use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::net::TcpStream;
use std::result;

use bufstream::IntoInnerError as BufError;
use native_tls::Error as TlsError;
use native_tls::HandshakeError as TlsHandshakeError;

/// A convenience wrapper around `Result` for `fetchmail::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while talking to the IMAP server.
///
/// Every error is terminal for the session. [`Error::exit_code`] gives the process exit status
/// the command-line front end reports for each of them.
#[derive(Debug)]
pub enum Error {
    /// The server address could not be resolved, or no address accepted a TCP connection.
    Connect(IoError),
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io(IoError),
    /// An error from the `native_tls` library during the TLS handshake.
    TlsHandshake(TlsHandshakeError<TcpStream>),
    /// An error from the `native_tls` library while setting up the connector.
    Tls(TlsError),
    /// The connection was terminated unexpectedly.
    ConnectionLost,
    /// The server completed a command with `NO` or `BAD`.
    Protocol(ProtocolFailure),
    /// The fetched message has no part this client is able to show.
    Mime(MimeError),
    /// Error validating input data.
    Validate(ValidateError),
}

impl Error {
    /// The process exit status that corresponds to this error.
    pub fn exit_code(&self) -> i32 {
        match *self {
            Error::Connect(_) | Error::Validate(_) => 1,
            Error::Io(_) | Error::ConnectionLost | Error::Tls(_) | Error::TlsHandshake(_) => 2,
            Error::Protocol(_) => 3,
            Error::Mime(_) => 4,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl<T> From<BufError<T>> for Error {
    fn from(err: BufError<T>) -> Error {
        Error::Io(err.into())
    }
}

impl From<TlsHandshakeError<TcpStream>> for Error {
    fn from(err: TlsHandshakeError<TcpStream>) -> Error {
        Error::TlsHandshake(err)
    }
}

impl From<TlsError> for Error {
    fn from(err: TlsError) -> Error {
        Error::Tls(err)
    }
}

impl From<ProtocolFailure> for Error {
    fn from(err: ProtocolFailure) -> Error {
        Error::Protocol(err)
    }
}

impl From<MimeError> for Error {
    fn from(err: MimeError) -> Error {
        Error::Mime(err)
    }
}

impl From<ValidateError> for Error {
    fn from(err: ValidateError) -> Error {
        Error::Validate(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Connect(ref e) => write!(f, "Could not connect: {}", e),
            Error::Io(ref e) => fmt::Display::fmt(e, f),
            Error::Tls(ref e) => fmt::Display::fmt(e, f),
            Error::TlsHandshake(ref e) => fmt::Display::fmt(e, f),
            Error::ConnectionLost => f.write_str("Connection lost"),
            Error::Protocol(ref e) => fmt::Display::fmt(e, f),
            Error::Mime(ref e) => fmt::Display::fmt(e, f),
            Error::Validate(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Connect(ref e) | Error::Io(ref e) => Some(e),
            Error::Tls(ref e) => Some(e),
            Error::TlsHandshake(ref e) => Some(e),
            Error::Protocol(ref e) => Some(e),
            Error::Mime(ref e) => Some(e),
            Error::Validate(ref e) => Some(e),
            Error::ConnectionLost => None,
        }
    }
}

/// The reason the server gave a `NO` or `BAD` completion, derived from the command it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFailure {
    /// `LOGIN` was rejected.
    AuthFailed,
    /// `SELECT` named a mailbox the server does not have.
    FolderNotFound,
    /// A `FETCH` named a message that does not exist, or returned no message data.
    MessageNotFound,
}

impl fmt::Display for ProtocolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ProtocolFailure::AuthFailed => "Login failure",
            ProtocolFailure::FolderNotFound => "Folder not found",
            ProtocolFailure::MessageNotFound => "Message not found",
        })
    }
}

impl StdError for ProtocolFailure {}

/// Ways the multipart walk can fail to produce a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeError {
    /// The message declares no usable boundary, or the boundary never occurs in the body.
    BoundaryNotFound,
    /// At least one part was examined, but none was `text/plain; charset=UTF-8` with a supported
    /// transfer encoding.
    InvalidMimePart,
    /// The walk ended before any part could be examined.
    NotFound,
}

impl fmt::Display for MimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            MimeError::BoundaryNotFound => "MIME boundary not found",
            MimeError::InvalidMimePart => "Unsupported MIME content type or transfer encoding",
            MimeError::NotFound => "No MIME part found",
        })
    }
}

impl StdError for MimeError {}

// Invalid character found. Expand as needed
#[derive(Debug)]
pub struct ValidateError(pub char);

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // print character in debug form because invalid ones are often whitespaces
        write!(f, "Invalid character in input: {:?}", self.0)
    }
}

impl StdError for ValidateError {}
