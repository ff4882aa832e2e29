use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fetchmail::config::{Action, SessionConfig};
use fetchmail::{session, ClientBuilder, Error, DEFAULT_PORT, DEFAULT_TLS_PORT};

/// Fetch a message from an IMAP server.
#[derive(Debug, Parser)]
#[command(name = "fetchmail", version)]
struct Cli {
    /// Login name.
    #[arg(short = 'u', value_name = "USERNAME")]
    username: String,

    /// Login password.
    #[arg(short = 'p', value_name = "PASSWORD")]
    password: String,

    /// Mailbox to read from [default: INBOX].
    #[arg(short = 'f', value_name = "FOLDER")]
    folder: Option<String>,

    /// Sequence number of the message [default: the most recent one].
    #[arg(short = 'n', value_name = "NUM", value_parser = clap::value_parser!(u32).range(1..))]
    message: Option<u32>,

    /// Use TLS on port 993 instead of plaintext on port 143.
    #[arg(short = 't')]
    tls: bool,

    /// Give up when the server sends nothing for this many seconds.
    #[arg(long, value_name = "SECONDS", env = "FETCHMAIL_TIMEOUT")]
    timeout: Option<u64>,

    /// Extra PEM root certificate to trust for TLS.
    #[arg(long = "ca-cert", value_name = "PATH")]
    ca_cert: Option<PathBuf>,

    /// Decode a quoted-printable body in `mime`.
    #[arg(long)]
    decode: bool,

    #[arg(value_enum)]
    command: Action,

    /// Host name of the IMAP server.
    server: String,
}

impl From<Cli> for SessionConfig {
    fn from(cli: Cli) -> Self {
        SessionConfig {
            username: cli.username,
            password: cli.password,
            folder: cli.folder.unwrap_or_default(),
            message: cli.message.into(),
            action: cli.command,
            server: cli.server,
            tls: cli.tls,
            read_timeout: cli.timeout.map(Duration::from_secs),
            ca_certificate: cli.ca_cert,
            decode: cli.decode,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            e.print().ok();
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli.into()) {
        match e {
            Error::Protocol(_) | Error::Mime(_) => println!("{}", e),
            _ => eprintln!("{}", e),
        }
        process::exit(e.exit_code());
    }
}

fn run(config: &SessionConfig) -> fetchmail::Result<()> {
    let port = if config.tls {
        DEFAULT_TLS_PORT
    } else {
        DEFAULT_PORT
    };
    let mut builder = ClientBuilder::new(config.server.as_str(), port);
    builder.tls(config.tls).read_timeout(config.read_timeout);
    if let Some(ref path) = config.ca_certificate {
        builder.ca_certificate(path);
    }

    let mut client = builder.connect()?;
    let output = session::run(&mut client, config)?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchmail::MessageSelector;

    #[test]
    fn full_command_line() {
        let cli = Cli::try_parse_from([
            "fetchmail", "-u", "bob", "-p", "secret", "-f", "Sent", "-n", "42", "-t", "mime",
            "imap.example.com",
        ])
        .unwrap();
        let config = SessionConfig::from(cli);
        assert_eq!(config.username, "bob");
        assert_eq!(config.folder, "Sent");
        assert_eq!(config.message, MessageSelector::Number(42));
        assert_eq!(config.action, Action::Mime);
        assert_eq!(config.server, "imap.example.com");
        assert!(config.tls);
    }

    #[test]
    fn defaults() {
        let cli =
            Cli::try_parse_from(["fetchmail", "list", "mail.test", "-u", "a", "-p", "b"]).unwrap();
        let config = SessionConfig::from(cli);
        assert_eq!(config.folder, "");
        assert_eq!(config.message, MessageSelector::Latest);
        assert!(!config.tls);
        assert!(!config.decode);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Cli::try_parse_from(["fetchmail", "-u", "a", "-p", "b", "list"]).is_err());
        assert!(Cli::try_parse_from(["fetchmail", "-u", "a", "-p", "b", "send", "host"]).is_err());
        assert!(
            Cli::try_parse_from(["fetchmail", "-u", "a", "-p", "b", "-n", "0", "list", "h"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["fetchmail", "-p", "b", "list", "h"]).is_err());
    }
}
