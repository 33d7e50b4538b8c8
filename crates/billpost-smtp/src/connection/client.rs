//! Type-state SMTP client.
//!
//! Each state owns the [`Session`]; a transition consumes the client and
//! returns it in the next state. A failing transition shuts the transport
//! down before handing the error back, so no caller has to remember to.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{ServerInfo, Session, SessionState};
use crate::command::{Command, check_hostname};
use crate::error::Result;
use crate::types::{Address, Reply};

/// Type-state marker: greeting received.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: EHLO accepted.
#[derive(Debug)]
pub struct Ready;

/// Type-state marker: authenticated.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker: mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker: recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker: data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<T, State> {
    session: Session<T>,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<T> Client<T, Greeted>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected transport and waits for the 220 greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not 220 or the transport fails;
    /// the transport is closed in that case.
    pub async fn greet(transport: T) -> Result<Self> {
        let mut session = Session::new(transport);
        let greeting = match session.expect_current().await {
            Ok(reply) => reply,
            Err(err) => {
                session.close().await;
                return Err(err);
            }
        };

        // Extract hostname from greeting (first word after code)
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            session,
            server_info: ServerInfo {
                hostname,
                capabilities: Vec::new(),
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the advertised capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHostname`](crate::Error::InvalidHostname)
    /// without writing anything if `client_hostname` is not a single
    /// printable token, or an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Client<T, Ready>> {
        if let Err(err) = check_hostname(client_hostname) {
            self.session.close().await;
            return Err(err);
        }
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.run(&cmd).await?;

        // First line echoes the server name, the rest are keywords
        self.server_info.capabilities = reply.message.into_iter().skip(1).collect();

        Ok(self.transition())
    }
}

impl<T> Client<T, Ready>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates with `AUTH LOGIN`: the command, then the base64
    /// username and password, each answering a 334 prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three exchanges is rejected; a bad
    /// password surfaces here as the server's 535 line.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<T, Authenticated>> {
        self.run(&Command::AuthLogin).await?;
        self.run(&Command::AuthUsername(username.to_string()))
            .await?;
        self.run(&Command::AuthPassword(password.to_string()))
            .await?;

        Ok(self.transition())
    }
}

impl<T> Client<T, Authenticated>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<T, MailTransaction>> {
        self.run(&Command::MailFrom { from }).await?;
        Ok(self.transition())
    }
}

impl<T> Client<T, MailTransaction>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds the recipient; 250 and 251 are both accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<T, RecipientAdded>> {
        self.run(&Command::RcptTo { to }).await?;
        Ok(self.transition())
    }
}

impl<T> Client<T, RecipientAdded>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<T, Data>> {
        self.run(&Command::Data).await?;
        Ok(self.transition())
    }
}

impl<T> Client<T, Data>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends the message content and completes the transaction.
    ///
    /// The message should be RFC 5322 formatted. Line endings are
    /// normalized to CRLF, leading dots are stuffed, and the terminating
    /// `.` line is added.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or the server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<T, Authenticated>> {
        match self.session.send_message(message).await {
            Ok(_) => Ok(self.transition()),
            Err(err) => {
                self.session.close().await;
                Err(err)
            }
        }
    }
}

// Common implementation for all states
impl<T, S> Client<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server information gathered so far.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns the protocol state of the underlying session.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Sends QUIT, waits for 221, and closes the transport (available in
    /// any state). The transport is closed whether or not QUIT succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let result = self.session.execute(&Command::Quit).await;
        self.session.close().await;
        result.map(|_| ())
    }

    /// Runs one command; on failure the transport is closed before the
    /// error is returned.
    async fn run(&mut self, cmd: &Command) -> Result<Reply> {
        match self.session.execute(cmd).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                self.session.close().await;
                Err(err)
            }
        }
    }

    fn transition<Next>(self) -> Client<T, Next> {
        Client {
            session: self.session,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}
