//! The subject listing of a whole mailbox.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::headers::NO_SUBJECT;
use crate::mime::unfold;
use crate::types::Command;
use crate::utils::{iter_join_onto, starts_with_ignore_case};

lazy_static! {
    static ref FETCH_MARKER: Regex = Regex::new(r"(?i)^\* (\d+) FETCH \(.*BODY\[").unwrap();
}

/// One message of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIndexEntry {
    /// The message sequence number, as sent by the server.
    pub sequence: String,
    pub subject: String,
}

impl fmt::Display for SubjectIndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sequence, self.subject)
    }
}

/// Subjects of every message in a mailbox, in ascending sequence-number order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectIndex {
    entries: Vec<SubjectIndexEntry>,
}

struct Block {
    sequence: String,
    subject: Option<String>,
    collecting: bool,
}

impl SubjectIndex {
    /// Builds the index from the response to `FETCH 1:* (BODY[HEADER.FIELDS (SUBJECT)])`.
    ///
    /// Each `* <n> FETCH (... BODY[...` line starts a new message. Its subject is the text after
    /// `Subject:` together with every following line up to the next message, the next untagged
    /// response or the tagged completion, unfolded and stripped of the trailing `)` that closes
    /// the fetch response. Messages without a `Subject` line get [`NO_SUBJECT`].
    pub fn parse(response: &str) -> Self {
        let completion = format!("{} ", Command::FetchSubjects.tag());
        let mut entries = Vec::new();
        let mut current: Option<Block> = None;

        for line in response.split_inclusive('\n') {
            if let Some(caps) = FETCH_MARKER.captures(line) {
                entries.extend(current.take().map(Block::finish));
                current = Some(Block {
                    sequence: caps[1].to_string(),
                    subject: None,
                    collecting: false,
                });
                continue;
            }

            let block = match current.as_mut() {
                Some(block) => block,
                None => continue,
            };
            if line.starts_with("* ") || starts_with_ignore_case(line, &completion) {
                block.collecting = false;
            } else if block.subject.is_none() && starts_with_ignore_case(line, "Subject:") {
                block.subject = Some(line["Subject:".len()..].to_string());
                block.collecting = true;
            } else if block.collecting {
                if let Some(subject) = block.subject.as_mut() {
                    subject.push_str(line);
                }
            }
        }
        entries.extend(current.map(Block::finish));

        // stable, so repeated sequence numbers keep their arrival order
        entries.sort_by_key(|entry: &SubjectIndexEntry| {
            entry.sequence.parse::<u64>().unwrap_or(u64::MAX)
        });
        SubjectIndex { entries }
    }

    pub fn entries(&self) -> &[SubjectIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Block {
    fn finish(self) -> SubjectIndexEntry {
        let subject = match self.subject {
            Some(raw) => {
                let unfolded = unfold(&raw);
                let trimmed = unfolded.trim();
                let trimmed = trimmed.strip_suffix(')').unwrap_or(trimmed);
                trimmed.trim_end().to_string()
            }
            None => NO_SUBJECT.to_string(),
        };
        SubjectIndexEntry {
            sequence: self.sequence,
            subject,
        }
    }
}

impl fmt::Display for SubjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        iter_join_onto(f, &self.entries, "\n")
    }
}

impl<'a> IntoIterator for &'a SubjectIndex {
    type Item = &'a SubjectIndexEntry;
    type IntoIter = std::slice::Iter<'a, SubjectIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
