//! Picking the plain-text body out of a multipart message.
//!
//! This is not a general MIME parser. The message is treated as a flat list of parts separated
//! by the boundary declared after `MIME-Version: 1.0`, and the first part that is
//! `text/plain; charset=UTF-8` with a `quoted-printable`, `7bit` or `8bit` transfer encoding is
//! selected. Nested multiparts, attachments and other charsets are not looked into.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::error::MimeError;
use crate::quoted_printable;
use crate::utils::{find, find_ignore_case, find_ignore_case_from, starts_with_ignore_case};

const CONTENT_TYPE: &str = "Content-Type:";
const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding:";
const SUPPORTED_ENCODINGS: [&str; 3] = ["quoted-printable", "7bit", "8bit"];

/// Removes header folding: every CRLF that is directly followed by a space or tab is dropped,
/// along with the whole run of spaces and tabs after it. The continuation is joined onto the
/// previous text without a separator.
///
/// ```
/// assert_eq!(
///     fetchmail::mime::unfold("Subject: a long\r\n \tsubject\r\nTo: me"),
///     "Subject: a longsubject\r\nTo: me"
/// );
/// ```
///
/// The result never contains a CRLF followed by whitespace, so unfolding is idempotent.
pub fn unfold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut folding = false;
    for c in text.chars() {
        let blank = c == ' ' || c == '\t';
        if blank && (folding || out.ends_with("\r\n")) {
            if !folding {
                out.truncate(out.len() - 2);
                folding = true;
            }
            continue;
        }
        folding = false;
        out.push(c);
    }
    out
}

/// Finds the multipart boundary declared by the message in `buffer`.
///
/// The `boundary=` parameter is only looked for after a `MIME-Version: 1.0` header (both matched
/// without regard to case). A quoted token runs to the closing quote; an unquoted one runs to
/// the next `;` or line ending. Returns `None` when either marker is missing, the closing quote
/// is missing, or the token is empty.
pub fn locate_mime_boundary(buffer: &[u8]) -> Option<String> {
    const PARAM: &[u8] = b"boundary=";

    let version = find_ignore_case(buffer, b"mime-version: 1.0")?;
    let value = find_ignore_case_from(buffer, PARAM, version)? + PARAM.len();
    let rest = &buffer[value..];

    let token = match rest.split_first() {
        Some((b'"', quoted)) => {
            let end = quoted.iter().position(|&b| b == b'"')?;
            &quoted[..end]
        }
        _ => {
            let end = rest
                .iter()
                .position(|&b| matches!(b, b';' | b'\r' | b'\n'))
                .unwrap_or(rest.len());
            &rest[..end]
        }
    };

    let token = String::from_utf8_lossy(token).trim_end().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// The part selected by [`parse_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePart<'a> {
    content_type: String,
    transfer_encoding: String,
    body: &'a [u8],
}

impl<'a> MimePart<'a> {
    /// The unfolded `Content-Type` value.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The unfolded `Content-Transfer-Encoding` value.
    pub fn transfer_encoding(&self) -> &str {
        &self.transfer_encoding
    }

    pub fn is_quoted_printable(&self) -> bool {
        self.transfer_encoding
            .to_ascii_lowercase()
            .contains("quoted-printable")
    }

    /// The body exactly as it appears in the message, without the line ending that precedes the
    /// next boundary.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// The body as text. The part declares UTF-8; invalid sequences are replaced.
    pub fn body_text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.body)
    }
}

/// Walks the parts of `buffer` delimited by `--boundary` and returns the first one that is
/// `text/plain; charset=UTF-8` with a supported transfer encoding.
///
/// Fails with:
/// - [`MimeError::BoundaryNotFound`] if the delimiter never occurs,
/// - [`MimeError::InvalidMimePart`] if parts were examined but none qualified,
/// - [`MimeError::NotFound`] if the walk ended before any part could be examined (the first
///   delimiter is the closing one, or the first part is malformed).
pub fn parse_parts<'a>(buffer: &'a [u8], boundary: &str) -> Result<MimePart<'a>, MimeError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut at = find_ignore_case(buffer, &delimiter).ok_or(MimeError::BoundaryNotFound)?;
    let mut rejected = 0;

    loop {
        let after = at + delimiter.len();
        if buffer[after..].starts_with(b"--") {
            debug!("reached closing boundary");
            break;
        }

        let header_start = match find(&buffer[after..], b"\n") {
            Some(i) => after + i + 1,
            None => break,
        };
        let (header_end, body_start) = if buffer[header_start..].starts_with(b"\r\n") {
            (header_start, header_start + 2)
        } else {
            match find(&buffer[header_start..], b"\r\n\r\n") {
                Some(i) => (header_start + i, header_start + i + 4),
                None => {
                    debug!("part at offset {} has no header separator", at);
                    break;
                }
            }
        };

        // unfold a copy, so the body offsets stay valid
        let headers = unfold(&String::from_utf8_lossy(&buffer[header_start..header_end]));
        let content_type = header_value(&headers, CONTENT_TYPE).unwrap_or_default();
        let transfer_encoding =
            header_value(&headers, CONTENT_TRANSFER_ENCODING).unwrap_or_default();
        let next = find_ignore_case_from(buffer, &delimiter, body_start);

        if is_supported(content_type, transfer_encoding) {
            let body_end = match next {
                Some(n) => trim_line_ending(buffer, body_start, n),
                None => buffer.len(),
            };
            return Ok(MimePart {
                content_type: content_type.to_string(),
                transfer_encoding: transfer_encoding.to_string(),
                body: &buffer[body_start..body_end],
            });
        }

        rejected += 1;
        warn!(
            "skipping part with Content-Type {:?} and Content-Transfer-Encoding {:?}",
            content_type, transfer_encoding
        );
        match next {
            Some(n) => at = n,
            None => break,
        }
    }

    Err(if rejected > 0 {
        MimeError::InvalidMimePart
    } else {
        MimeError::NotFound
    })
}

/// Finds the boundary of the message in `buffer` and returns the body of its plain-text part.
///
/// With `decode_quoted_printable` set, a part declared `quoted-printable` is decoded; otherwise
/// the body is returned as it appears in the message.
pub fn extract_text_body(buffer: &[u8], decode_quoted_printable: bool) -> Result<String, MimeError> {
    let boundary = locate_mime_boundary(buffer).ok_or(MimeError::BoundaryNotFound)?;
    debug!("multipart boundary is {:?}", boundary);
    let part = parse_parts(buffer, &boundary)?;
    if decode_quoted_printable && part.is_quoted_printable() {
        Ok(quoted_printable::decode_to_string(part.body()))
    } else {
        Ok(part.body_text().into_owned())
    }
}

/// The value of the first header called `name` (which includes the colon) in an unfolded header
/// block, with leading whitespace removed.
fn header_value<'h>(headers: &'h str, name: &str) -> Option<&'h str> {
    headers
        .lines()
        .find(|line| starts_with_ignore_case(line, name))
        .map(|line| line[name.len()..].trim())
}

fn is_supported(content_type: &str, transfer_encoding: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase().replace('"', "");
    let transfer_encoding = transfer_encoding.to_ascii_lowercase();
    content_type.contains("text/plain")
        && content_type.contains("charset=utf-8")
        && SUPPORTED_ENCODINGS
            .iter()
            .any(|enc| transfer_encoding.contains(enc))
}

/// Moves `end` back over exactly one `\r\n` or `\n`, never before `start`.
fn trim_line_ending(buffer: &[u8], start: usize, end: usize) -> usize {
    let body = &buffer[start..end];
    if body.ends_with(b"\r\n") {
        end - 2
    } else if body.ends_with(b"\n") {
        end - 1
    } else {
        end
    }
}
