use std::fmt;

use super::Seq;

/// Which message of the selected mailbox a `FETCH` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageSelector {
    /// The message with the highest sequence number, written `*`.
    #[default]
    Latest,
    /// The message with the given sequence number.
    Number(Seq),
}

impl From<Option<Seq>> for MessageSelector {
    fn from(n: Option<Seq>) -> Self {
        n.map_or(MessageSelector::Latest, MessageSelector::Number)
    }
}

impl fmt::Display for MessageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MessageSelector::Latest => f.write_str("*"),
            MessageSelector::Number(n) => write!(f, "{}", n),
        }
    }
}
