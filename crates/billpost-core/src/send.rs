//! Sending one message through the configured relay.
//!
//! A send composes the message first, then dials the relay and walks the
//! dialogue greeting, EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA, QUIT. Any
//! failure aborts the remaining steps; the transport is closed on every path.

use billpost_mime::{InlineAsset, Message, MessageBuilder};
use billpost_smtp::connection::connect;
use billpost_smtp::{Address, Client};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::Instrument;

use crate::config::SmtpConfig;
use crate::error::Result;

/// An email message to send.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML body; derived from `text` when absent.
    pub html: Option<String>,
    /// Image referenced from the HTML via `cid:`.
    pub inline: Option<InlineAsset>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            html: None,
            inline: None,
        }
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Attaches an inline asset.
    #[must_use]
    pub fn inline(mut self, asset: InlineAsset) -> Self {
        self.inline = Some(asset);
        self
    }

    /// Builds the MIME message with the sender from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Composition`](crate::SendError::Composition) if
    /// the message cannot be composed.
    pub fn compose(&self, config: &SmtpConfig) -> Result<Message> {
        let mut builder = MessageBuilder::new()
            .from(&config.from_name, &config.from_address)
            .to(&self.to)
            .subject(&self.subject)
            .text_body(&self.text)
            .html_body_opt(self.html.clone());
        if let Some(asset) = &self.inline {
            builder = builder.inline(asset.clone());
        }
        Ok(builder.build()?)
    }
}

/// Validated envelope sender and recipient.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// `MAIL FROM` address.
    pub from: Address,
    /// `RCPT TO` address.
    pub to: Address,
}

impl Envelope {
    /// Validates both addresses.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`](crate::SendError::Configuration)
    /// if either address is invalid.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            from: Address::new(from)?,
            to: Address::new(to)?,
        })
    }
}

/// Sends `message` through the relay described by `config`.
///
/// Addresses are validated and the message is composed before any network
/// activity, so configuration and composition errors never open a socket.
///
/// # Errors
///
/// Returns the configuration, composition, transport or protocol error that
/// stopped the send.
pub async fn send_email(config: &SmtpConfig, message: &OutgoingMessage) -> Result<()> {
    let span = tracing::info_span!("send_email", host = %config.host, to = %message.to);

    let result = send_logged(config, message).instrument(span.clone()).await;
    if let Err(e) = &result {
        span.in_scope(|| tracing::warn!(error = %e, "Email send failed"));
    }
    result
}

async fn send_logged(config: &SmtpConfig, message: &OutgoingMessage) -> Result<()> {
    let envelope = Envelope::new(&config.from_address, &message.to)?;
    let payload = message.compose(config)?.to_string();

    tracing::info!(
        port = config.port,
        secure = config.secure,
        size = payload.len(),
        "Sending email"
    );

    let stream = connect(&config.host, config.port, config.secure).await?;
    deliver(stream, config, envelope, payload.as_bytes()).await?;

    tracing::info!("Email sent");
    Ok(())
}

/// Runs the SMTP dialogue for one message over an already open transport.
///
/// `payload` is the rendered message; dot-stuffing and the terminating
/// `.` line are added here.
///
/// # Errors
///
/// Returns the first transport or protocol error. The transport has been
/// closed by the time this returns, on success and on failure.
pub async fn deliver<T>(
    transport: T,
    config: &SmtpConfig,
    envelope: Envelope,
    payload: &[u8],
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let client = Client::greet(transport).await?;
    let client = client.ehlo(&config.helo_name).await?;
    let client = client.auth_login(&config.username, &config.password).await?;
    let client = client.mail_from(envelope.from).await?;
    let client = client.rcpt_to(envelope.to).await?;
    let client = client.data().await?;
    let client = client.send_message(payload).await?;
    client.quit().await?;
    Ok(())
}
