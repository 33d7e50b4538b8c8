//! # billpost-core
//!
//! Sends invoice emails through an SMTP relay.
//!
//! This crate provides:
//! - Relay configuration from `SMTP_*` environment variables
//! - Send orchestration on top of `billpost-smtp` and `billpost-mime`
//! - A process-wide inline logo, loaded once
//! - The invoice email renderer (subject, plain text, HTML card)
//! - One error type separating configuration, transport and protocol failures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod invoice;
pub mod logo;
pub mod send;

pub use config::SmtpConfig;
pub use error::{Result, SendError};
pub use invoice::{BusinessSettings, Client, Invoice, InvoiceDocument, InvoiceEmail, LineItem};
pub use logo::{LOGO_CONTENT_ID, cached_logo, load_logo};
pub use send::{Envelope, OutgoingMessage, deliver, send_email};

/// Renders and sends the invoice email for `document` to its client.
///
/// The configured logo is attached inline when it can be read.
///
/// # Errors
///
/// Returns [`SendError::Configuration`] if the client has no email address,
/// or any error from [`send_email`].
pub async fn send_invoice(config: &SmtpConfig, document: &InvoiceDocument) -> Result<()> {
    document.recipient()?;
    let logo = cached_logo(&config.logo_path);
    let message = InvoiceEmail::render(document, logo.as_ref()).into_message(document, logo)?;
    send_email(config, &message).await
}
