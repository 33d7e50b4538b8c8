//! Error types for sending mail.

use billpost_smtp::ReplyCode;
use thiserror::Error;

/// Why a send failed.
#[derive(Debug, Error)]
pub enum SendError {
    /// A required setting is missing or invalid; raised before any network
    /// activity.
    #[error("SMTP configuration error: {0}")]
    Configuration(String),

    /// Connecting, TLS negotiation or the transport itself failed.
    #[error("SMTP transport error: {0}")]
    Transport(#[source] billpost_smtp::Error),

    /// The server answered outside the accepted codes or sent an
    /// unparseable reply. The message carries the raw server line.
    #[error(transparent)]
    Protocol(billpost_smtp::Error),

    /// The MIME message could not be composed.
    #[error("failed to compose message: {0}")]
    Composition(#[from] billpost_mime::Error),

    /// The invoice document could not be read.
    #[error("invalid invoice document: {0}")]
    Document(#[from] serde_json::Error),
}

impl From<billpost_smtp::Error> for SendError {
    fn from(err: billpost_smtp::Error) -> Self {
        match err {
            billpost_smtp::Error::InvalidAddress(addr) => {
                Self::Configuration(format!("invalid email address: {addr}"))
            }
            err @ billpost_smtp::Error::InvalidHostname(_) => Self::Configuration(err.to_string()),
            err if err.is_transport() => Self::Transport(err),
            err => Self::Protocol(err),
        }
    }
}

impl SendError {
    /// Returns the SMTP reply code if the server rejected a command.
    #[must_use]
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Protocol(err) => err.reply_code().map(ReplyCode::as_u16),
            _ => None,
        }
    }
}

/// Result type alias using [`SendError`].
pub type Result<T> = std::result::Result<T, SendError>;
