//! This module contains types used throughout the IMAP protocol.

/// From section [2.3.1.2 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.2).
///
/// A relative position from 1 to the number of messages in the mailbox.
/// This position is ordered by ascending unique identifier.  As each new message is added, it is
/// assigned a message sequence number that is 1 higher than the number of messages in the mailbox
/// before that new message was added.
///
/// Message sequence numbers can be reassigned during the session.  For example, when a message is
/// permanently removed (expunged) from the mailbox, the message sequence number for all subsequent
/// messages is decremented.
pub type Seq = u32;

mod command;
pub use self::command::Command;

mod selector;
pub use self::selector::MessageSelector;
