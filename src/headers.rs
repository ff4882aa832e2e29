use std::fmt;

use crate::mime::unfold;
use crate::utils::starts_with_ignore_case;

/// The subject shown for a message that has no `Subject` header.
pub const NO_SUBJECT: &str = "<No subject>";

/// The summary headers of one message, as returned for
/// `BODY.PEEK[HEADER.FIELDS (FROM TO DATE SUBJECT)]`.
///
/// Missing fields are empty, except [`subject`](HeaderFields::subject) which falls back to
/// [`NO_SUBJECT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFields {
    pub from: String,
    pub to: String,
    pub date: String,
    pub subject: String,
}

impl Default for HeaderFields {
    fn default() -> Self {
        HeaderFields {
            from: String::new(),
            to: String::new(),
            date: String::new(),
            subject: NO_SUBJECT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    From,
    To,
    Subject,
}

const FIELDS: [(&str, Field); 4] = [
    ("Date:", Field::Date),
    ("From:", Field::From),
    ("To:", Field::To),
    ("Subject:", Field::Subject),
];

impl HeaderFields {
    /// Extracts `Date`, `From`, `To` and `Subject` from a header block.
    ///
    /// A line that starts with one of the field names opens that field; following lines that
    /// start with a space or tab are folded into it; any other line closes it. Values are
    /// unfolded and trimmed. If a field occurs more than once the first occurrence wins.
    pub fn parse(text: &str) -> Self {
        let mut found: [Option<String>; 4] = Default::default();
        let mut open: Option<(Field, String)> = None;

        for line in text.split_inclusive('\n') {
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, ref mut value)) = open {
                    value.push_str(line);
                }
                continue;
            }

            if let Some((field, value)) = open.take() {
                close(&mut found, field, &value);
            }
            open = FIELDS
                .iter()
                .find(|(name, _)| starts_with_ignore_case(line, name))
                .map(|&(name, field)| (field, line[name.len()..].to_string()));
        }
        if let Some((field, value)) = open.take() {
            close(&mut found, field, &value);
        }

        let [date, from, to, subject] = found;
        let defaults = HeaderFields::default();
        HeaderFields {
            from: from.unwrap_or(defaults.from),
            to: to.unwrap_or(defaults.to),
            date: date.unwrap_or(defaults.date),
            subject: subject.unwrap_or(defaults.subject),
        }
    }
}

fn close(found: &mut [Option<String>; 4], field: Field, value: &str) {
    let slot = &mut found[field as usize];
    if slot.is_none() {
        *slot = Some(unfold(value).trim().to_string());
    }
}

impl fmt::Display for HeaderFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in [
            ("From:", &self.from),
            ("To:", &self.to),
            ("Date:", &self.date),
            ("Subject:", &self.subject),
        ] {
            if value.is_empty() {
                writeln!(f, "{}", label)?;
            } else {
                writeln!(f, "{} {}", label, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fields() {
        let text = "From: Alice <alice@example.com>\r\n\
                    To: bob@example.com\r\n\
                    Date: Mon, 6 May 2024 10:00:00 +1000\r\n\
                    Subject: Hello\r\n\
                    \r\n";
        let fields = HeaderFields::parse(text);
        assert_eq!(fields.from, "Alice <alice@example.com>");
        assert_eq!(fields.to, "bob@example.com");
        assert_eq!(fields.date, "Mon, 6 May 2024 10:00:00 +1000");
        assert_eq!(fields.subject, "Hello");
    }

    #[test]
    fn defaults() {
        let fields = HeaderFields::parse("From: a@b\r\n\r\n");
        assert_eq!(fields.to, "");
        assert_eq!(fields.date, "");
        assert_eq!(fields.subject, NO_SUBJECT);
    }

    #[test]
    fn folded_and_case_insensitive() {
        let text = "SUBJECT: a very\r\n long\r\n\tsubject\r\n\
                    to: x@y,\r\n z@w\r\n\
                    X-Other: ignored\r\n  still ignored\r\n";
        let fields = HeaderFields::parse(text);
        assert_eq!(fields.subject, "a verylongsubject");
        assert_eq!(fields.to, "x@y,z@w");
        assert_eq!(fields.from, "");
    }

    #[test]
    fn fetch_response_framing_is_ignored() {
        let text = "* 1 FETCH (BODY[HEADER.FIELDS (FROM TO DATE SUBJECT)] {34}\r\n\
                    Subject: framed\r\n\
                    From: a@b\r\n\
                    \r\n\
                    )\r\n\
                    A04 OK Fetch completed\r\n";
        let fields = HeaderFields::parse(text);
        assert_eq!(fields.subject, "framed");
        assert_eq!(fields.from, "a@b");
    }

    #[test]
    fn first_occurrence_wins() {
        let fields = HeaderFields::parse("Subject: one\r\nSubject: two\r\n");
        assert_eq!(fields.subject, "one");
    }

    #[test]
    fn display() {
        let fields = HeaderFields {
            from: "a@b".to_string(),
            to: String::new(),
            date: "today".to_string(),
            subject: NO_SUBJECT.to_string(),
        };
        assert_eq!(
            fields.to_string(),
            "From: a@b\nTo:\nDate: today\nSubject: <No subject>\n"
        );
    }
}
