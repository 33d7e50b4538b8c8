//! SMTP connection management: transports, reply framing, the session state
//! machine and the type-state client built on top of it.

mod client;
mod reader;
mod session;
mod state;
mod stream;

pub use client::{Authenticated, Client, Data, Greeted, MailTransaction, Ready, RecipientAdded};
pub use reader::{MAX_LINE_LENGTH, ReplyBuffer};
pub use session::Session;
pub use state::SessionState;
pub use stream::{SmtpStream, connect, connect_plain, connect_tls, create_tls_connector};

/// What the server told us about itself during the handshake.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// EHLO keywords advertised by the server (e.g. `AUTH LOGIN PLAIN`).
    pub capabilities: Vec<String>,
}

impl ServerInfo {
    /// Checks whether the server advertised an EHLO keyword.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.capabilities.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|kw| kw.eq_ignore_ascii_case(keyword))
        })
    }
}
