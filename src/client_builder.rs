use std::fs;
use std::io;
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use native_tls::{Certificate, TlsConnector, TlsStream};
use tracing::debug;

use crate::client::Client;
use crate::conn::Connection;
use crate::error::{Error, Result};

/// The IMAP port for plaintext sessions.
pub const DEFAULT_PORT: u16 = 143;
/// The IMAP port for sessions encrypted from the start.
pub const DEFAULT_TLS_PORT: u16 = 993;

/// A convenience builder for [`Client`] structs over plaintext or TLS transports.
///
/// ```no_run
/// # use fetchmail::ClientBuilder;
/// # fn main() -> Result<(), fetchmail::Error> {
/// let client = ClientBuilder::new("imap.example.com", 993).tls(true).connect()?;
/// # Ok(())
/// # }
/// ```
///
/// The returned client has already read the server greeting.
pub struct ClientBuilder<D>
where
    D: AsRef<str>,
{
    domain: D,
    port: u16,
    tls: bool,
    read_timeout: Option<Duration>,
    ca_certificate: Option<PathBuf>,
}

impl<D> ClientBuilder<D>
where
    D: AsRef<str>,
{
    /// Make a new `ClientBuilder` using the given domain and port.
    pub fn new(domain: D, port: u16) -> Self {
        ClientBuilder {
            domain,
            port,
            tls: false,
            read_timeout: None,
            ca_certificate: None,
        }
    }

    /// Encrypt the connection with TLS as soon as it is established.
    pub fn tls(&mut self, tls: bool) -> &mut Self {
        self.tls = tls;
        self
    }

    /// Give up on a read after `timeout`. By default reads wait forever.
    pub fn read_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.read_timeout = timeout;
        self
    }

    /// Trust the PEM certificate at `path` as an additional root when verifying the server.
    pub fn ca_certificate<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.ca_certificate = Some(path.into());
        self
    }

    /// Connects, performs the TLS handshake if requested, and reads the greeting.
    ///
    /// Resolution and TCP failures are reported as [`Error::Connect`]; TLS setup and handshake
    /// failures as [`Error::Tls`] and [`Error::TlsHandshake`].
    pub fn connect(&mut self) -> Result<Client<Connection>> {
        let domain = self.domain.as_ref();
        let tcp = TcpStream::connect((domain, self.port)).map_err(Error::Connect)?;
        debug!("connected to {}:{}", domain, self.port);

        let stream: Connection = if self.tls {
            Box::new(self.handshake(tcp)?)
        } else {
            Box::new(tcp)
        };
        let mut client = Client::new(stream);
        client.set_read_timeout(self.read_timeout)?;
        client.read_greeting()?;
        Ok(client)
    }

    fn handshake(&self, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
        let ssl_conn = self.tls_connector()?;
        let tls = ssl_conn.connect(self.domain.as_ref(), tcp)?;
        debug!("TLS handshake with {} complete", self.domain.as_ref());
        Ok(tls)
    }

    fn tls_connector(&self) -> Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if let Some(ref path) = self.ca_certificate {
            let pem = fs::read(path).map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("cannot read CA certificate {}: {}", path.display(), e),
                ))
            })?;
            builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        Ok(builder.build()?)
    }
}
