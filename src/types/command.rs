use crate::error::ProtocolFailure;

/// The commands this client issues, one per session phase.
///
/// Each command owns a fixed tag. Only one command is ever outstanding, so the tags never need to
/// be unique across a session; they exist so the completion line can be recognised in the
/// server's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `LOGIN <user> <pass>`
    Login,
    /// `SELECT "<mailbox>"`
    Select,
    /// `FETCH <n|*> BODY.PEEK[]`, the full raw message.
    Fetch,
    /// `FETCH <n|*> BODY.PEEK[HEADER.FIELDS (FROM TO DATE SUBJECT)]`
    FetchHeaders,
    /// `FETCH 1:* (BODY[HEADER.FIELDS (SUBJECT)])`, the subject of every message.
    FetchSubjects,
}

impl Command {
    /// The tag this command is sent with.
    pub fn tag(self) -> &'static str {
        match self {
            Command::Login => "A01",
            Command::Select => "A02",
            Command::Fetch => "A03",
            Command::FetchHeaders => "A04",
            Command::FetchSubjects => "A06",
        }
    }

    /// What a `NO` or `BAD` completion of this command means to the user.
    pub fn failure(self) -> ProtocolFailure {
        match self {
            Command::Login => ProtocolFailure::AuthFailed,
            Command::Select => ProtocolFailure::FolderNotFound,
            Command::Fetch | Command::FetchHeaders | Command::FetchSubjects => {
                ProtocolFailure::MessageNotFound
            }
        }
    }
}
