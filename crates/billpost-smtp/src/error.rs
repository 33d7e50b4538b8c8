//! Error types for SMTP operations.

use std::io;

use crate::connection::SessionState;
use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on an established transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TCP connection to the relay failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// `host:port` that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// TLS negotiation failed.
    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        /// Server name used for certificate validation.
        host: String,
        /// Underlying handshake error.
        #[source]
        source: io::Error,
    },

    /// Host cannot be used as a TLS server name.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// Peer closed the connection while a reply was awaited.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Server answered with a code outside the accepted set.
    #[error("SMTP error {line} (while {state})")]
    UnexpectedReply {
        /// State the session was in when the reply arrived.
        state: SessionState,
        /// Codes that would have been accepted.
        expected: Vec<ReplyCode>,
        /// Code of the final reply line.
        code: ReplyCode,
        /// Raw final reply line as sent by the server.
        line: String,
    },

    /// Reply line did not start with a three-digit code.
    #[error("malformed reply line: {0}")]
    MalformedReply(String),

    /// Server sent a line longer than the framing limit.
    #[error("reply line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Client identity unusable as the `EHLO` argument.
    #[error("invalid EHLO hostname: {0:?}")]
    InvalidHostname(String),
}

impl Error {
    /// Returns the reply code when the server rejected a command.
    #[must_use]
    pub const fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Self::UnexpectedReply { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent rejection (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::UnexpectedReply { code, .. } if code.is_permanent())
    }

    /// Returns true if this is a transient rejection (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::UnexpectedReply { code, .. } if code.is_transient())
    }

    /// Returns true if the failure happened below the SMTP dialogue
    /// (socket, TLS, or the peer going away).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Connect { .. }
                | Self::Tls { .. }
                | Self::InvalidServerName(_)
                | Self::ConnectionClosed
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_reply_display_carries_raw_line() {
        let err = Error::UnexpectedReply {
            state: SessionState::AwaitRcptOk,
            expected: vec![ReplyCode::OK, ReplyCode::FORWARD],
            code: ReplyCode::MAILBOX_UNAVAILABLE,
            line: "550 5.1.1 No such user".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("550 5.1.1 No such user"));
        assert!(err.is_permanent());
        assert!(!err.is_transient());
        assert!(!err.is_transport());
        assert_eq!(err.reply_code(), Some(ReplyCode::MAILBOX_UNAVAILABLE));
    }

    #[test]
    fn transport_classification() {
        assert!(Error::ConnectionClosed.is_transport());
        assert!(Error::InvalidServerName("bad host".into()).is_transport());
        assert!(!Error::MalformedReply("xyz".into()).is_transport());
        assert_eq!(Error::ConnectionClosed.reply_code(), None);
        assert!(!Error::InvalidHostname("a\r\nRSET".into()).is_transport());
    }
}
