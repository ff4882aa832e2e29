//! A small IMAP mail-retrieval client.
//!
//! The client speaks a fixed subset of IMAP: it logs in, selects a mailbox and issues one kind
//! of `FETCH`. Responses are gathered by [`response::read_until_tagged`], which reads raw chunks
//! until the command's tagged completion shows up, and the fetched data is then interpreted by
//! one of:
//!
//! - [`response::extract_literal`] for the raw message,
//! - [`HeaderFields`] for the summary headers,
//! - [`mime::extract_text_body`] for the plain-text part of a multipart message,
//! - [`SubjectIndex`] for the subjects of every message in the mailbox.
//!
//! # Usage
//!
//! ```no_run
//! use fetchmail::{ClientBuilder, MessageSelector};
//!
//! fn main() -> fetchmail::Result<()> {
//!     let mut client = ClientBuilder::new("imap.example.com", 993).tls(true).connect()?;
//!     client.login("username", "password")?;
//!     client.select("INBOX")?;
//!
//!     let headers = client.fetch_header_fields(MessageSelector::Latest)?;
//!     print!("{}", headers);
//!
//!     for entry in &client.fetch_subjects()? {
//!         println!("{}", entry);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod conn;
mod headers;
mod subjects;
mod utils;

pub mod config;
pub mod error;
pub mod mime;
pub mod quoted_printable;
pub mod response;
pub mod session;
pub mod types;

pub use crate::client::{Client, DEFAULT_MAILBOX};
pub use crate::client_builder::{ClientBuilder, DEFAULT_PORT, DEFAULT_TLS_PORT};
pub use crate::conn::{Connection, ImapConnection, SetReadTimeout};
pub use crate::error::{Error, MimeError, ProtocolFailure, Result};
pub use crate::headers::{HeaderFields, NO_SUBJECT};
pub use crate::subjects::{SubjectIndex, SubjectIndexEntry};
pub use crate::types::*;

#[cfg(test)]
mod mock_stream;
