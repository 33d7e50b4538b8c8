//! SMTP command builder.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::connection::SessionState;
use crate::error::{Error, Result};
use crate::types::{Address, ReplyCode};

/// SMTP command issued by the submission dialogue.
///
/// Every command knows which state the session enters after writing it and
/// therefore which reply codes it accepts.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// AUTH LOGIN - Begin LOGIN authentication
    AuthLogin,
    /// Base64 username answering the first 334 prompt
    AuthUsername(String),
    /// Base64 password answering the second 334 prompt
    AuthPassword(String),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Ehlo { hostname } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::AuthLogin => {
                buf.extend_from_slice(b"AUTH LOGIN");
            }
            Self::AuthUsername(secret) | Self::AuthPassword(secret) => {
                buf.extend_from_slice(STANDARD.encode(secret.as_bytes()).as_bytes());
            }
            Self::MailFrom { from } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(from.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::RcptTo { to } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(to.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::Data => {
                buf.extend_from_slice(b"DATA");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// State the session is in while this command's reply is outstanding.
    #[must_use]
    pub const fn awaits(&self) -> SessionState {
        match self {
            Self::Ehlo { .. } => SessionState::AwaitEhlo,
            Self::AuthLogin => SessionState::AwaitAuthUsernamePrompt,
            Self::AuthUsername(_) => SessionState::AwaitAuthPasswordPrompt,
            Self::AuthPassword(_) => SessionState::AwaitAuthResult,
            Self::MailFrom { .. } => SessionState::AwaitMailOk,
            Self::RcptTo { .. } => SessionState::AwaitRcptOk,
            Self::Data => SessionState::AwaitDataReady,
            Self::Quit => SessionState::AwaitQuitOk,
        }
    }

    /// Reply codes that complete this command successfully.
    #[must_use]
    pub const fn expected(&self) -> &'static [ReplyCode] {
        self.awaits().expected()
    }
}

/// Loggable rendering; credentials are never printed.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::AuthLogin => f.write_str("AUTH LOGIN"),
            Self::AuthUsername(_) => f.write_str("<username>"),
            Self::AuthPassword(_) => f.write_str("<password>"),
            Self::MailFrom { from } => write!(f, "MAIL FROM:<{from}>"),
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::Data => f.write_str("DATA"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Checks that `hostname` is a single printable ASCII token usable as the
/// `EHLO` argument.
///
/// # Errors
///
/// Returns [`Error::InvalidHostname`] for an empty value or one containing
/// whitespace, control or non-ASCII characters.
pub fn check_hostname(hostname: &str) -> Result<()> {
    if hostname.is_empty() || !hostname.chars().all(|c| c.is_ascii_graphic()) {
        return Err(Error::InvalidHostname(hostname.to_string()));
    }
    Ok(())
}

/// Encodes a message for the DATA phase.
///
/// Line endings are normalized to CRLF, lines starting with `.` are
/// dot-stuffed (RFC 5321 section 4.5.2), and the `.` terminator line is
/// appended. A message that does not end with a line break gets one before
/// the terminator.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);

    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !message.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
