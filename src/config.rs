use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::MessageSelector;

/// What to do with the selected message or mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Action {
    /// Print the raw message.
    Retrieve,
    /// Print the `From`, `To`, `Date` and `Subject` headers of the message.
    Parse,
    /// Print the plain-text part of a multipart message.
    Mime,
    /// Print the subject of every message in the mailbox.
    List,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Action::Retrieve => "retrieve",
            Action::Parse => "parse",
            Action::Mime => "mime",
            Action::List => "list",
        })
    }
}

/// A validated description of one session: where to connect, how to log in and what to fetch.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    pub password: String,
    /// Mailbox to select; empty means `INBOX`.
    pub folder: String,
    pub message: MessageSelector,
    pub action: Action,
    pub server: String,
    /// Connect on the TLS port and encrypt the session.
    pub tls: bool,
    /// Deadline for each read; `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Additional PEM root certificate to trust for TLS.
    pub ca_certificate: Option<PathBuf>,
    /// Decode quoted-printable bodies in `mime`.
    pub decode: bool,
}
