//! Transport to the relay: plaintext TCP or implicit TLS.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::error::{Error, Result};

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl SmtpStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Opens the transport selected by `secure`: implicit TLS when true,
/// plaintext TCP otherwise. There is no STARTTLS path.
///
/// # Errors
///
/// Returns an error if the connection or the TLS handshake fails.
pub async fn connect(hostname: &str, port: u16, secure: bool) -> Result<SmtpStream> {
    if secure {
        connect_tls(hostname, port).await
    } else {
        connect_plain(hostname, port).await
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect_plain(hostname: &str, port: u16) -> Result<SmtpStream> {
    let stream = dial(hostname, port).await?;
    Ok(SmtpStream::Tcp(stream))
}

/// Connects to an SMTP server over TLS (implicit TLS, usually port 465).
///
/// `hostname` is also the server name the certificate is validated against.
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidServerName(hostname.to_string()))?;

    let tcp_stream = dial(hostname, port).await?;

    let connector = create_tls_connector();
    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::Tls {
            host: hostname.to_string(),
            source,
        })?;
    debug!(host = hostname, "TLS session established");

    Ok(SmtpStream::Tls(Box::new(tls_stream)))
}

async fn dial(hostname: &str, port: u16) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| Error::Connect {
            addr: addr.clone(),
            source,
        })?;
    debug!(%addr, "TCP connection established");
    Ok(stream)
}

/// Creates a TLS connector trusting the webpki root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
