//! Best-effort quoted-printable decoding (RFC 2045, section 6.7).
//!
//! Decoding is never applied implicitly; callers decide whether a body should be passed through
//! [`decode`].

use quoted_printable::ParseMode;
use tracing::warn;

const URL_MARKER: &[u8] = b"http";
const ESCAPED_EQUALS: &[u8] = b"=3D";

/// Decodes `=XY` escapes and removes soft line breaks (`=\r\n` and `=\n`).
///
/// Malformed escapes are copied through unchanged. An escape that sits inside a word containing
/// `http` is also left alone, so that query strings such as `?a=1F` in a URL that was never
/// encoded survive intact. This is a heuristic: a genuinely encoded URL will not be decoded.
///
/// ```
/// assert_eq!(fetchmail::quoted_printable::decode(b"caf=C3=A9 ol=\r\n=C3=A9"), "café olé".as_bytes());
/// ```
pub fn decode(input: &[u8]) -> Vec<u8> {
    let protected = protect_urls(input);
    ::quoted_printable::decode(&protected, ParseMode::Robust).unwrap_or_else(|err| {
        warn!("quoted-printable decode failed, keeping the body as is: {}", err);
        input.to_vec()
    })
}

/// Decodes `input` and interprets the result as UTF-8, replacing invalid sequences.
pub fn decode_to_string(input: &[u8]) -> String {
    String::from_utf8_lossy(&decode(input)).into_owned()
}

/// Rewrites every `=` that follows `http` within the same whitespace-delimited word as `=3D`,
/// so the decoder turns it back into a literal `=`. Soft line breaks are kept as they are.
fn protect_urls(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut word_start = 0;
    let mut in_url = false;
    for (i, &b) in input.iter().enumerate() {
        if b.is_ascii_whitespace() {
            word_start = i + 1;
            in_url = false;
        } else if !in_url && i + 1 >= word_start + URL_MARKER.len() {
            in_url = input[i + 1 - URL_MARKER.len()..=i].eq_ignore_ascii_case(URL_MARKER);
        }

        if b == b'=' && in_url && !is_soft_break(&input[i + 1..]) {
            out.extend_from_slice(ESCAPED_EQUALS);
        } else {
            out.push(b);
        }
    }
    out
}

fn is_soft_break(rest: &[u8]) -> bool {
    rest.starts_with(b"\r\n") || rest.starts_with(b"\n")
}
