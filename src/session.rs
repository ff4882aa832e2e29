//! One complete session: log in, select, then carry out a single [`Action`].

use std::io::{Read, Write};

use tracing::debug;

use crate::client::Client;
use crate::config::{Action, SessionConfig};
use crate::error::Result;
use crate::mime;
use crate::response::concatenate;

/// Logs in, selects the configured folder and performs the configured action, returning what
/// should be written to standard output.
///
/// The client must already have consumed the server greeting.
pub fn run<T: Read + Write>(client: &mut Client<T>, config: &SessionConfig) -> Result<Vec<u8>> {
    client.login(&config.username, &config.password)?;
    debug!("logged in as {}", config.username);
    client.select(&config.folder)?;
    debug!("running {} on message {}", config.action, config.message);

    match config.action {
        Action::Retrieve => client.fetch_raw(config.message),
        Action::Parse => Ok(client
            .fetch_header_fields(config.message)?
            .to_string()
            .into_bytes()),
        Action::Mime => {
            let buffer = concatenate(&client.fetch(config.message)?);
            let mut body = mime::extract_text_body(&buffer, config.decode)?;
            body.push('\n');
            Ok(body.into_bytes())
        }
        Action::List => {
            let mut listing = client.fetch_subjects()?.to_string();
            if !listing.is_empty() {
                listing.push('\n');
            }
            Ok(listing.into_bytes())
        }
    }
}
