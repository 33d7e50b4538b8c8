//! Command/reply sequencing over one transport.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::{ReplyBuffer, SessionState};
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::{parse_line, parse_reply};
use crate::types::{Reply, ReplyCode};

/// One SMTP dialogue: the transport, the receive buffer, and the reply
/// currently awaited.
///
/// Every operation takes `&mut self`, so at most one expectation can be
/// outstanding and commands are never pipelined.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    buffer: ReplyBuffer,
    state: SessionState,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a freshly connected transport. The first expectation is the
    /// server greeting.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buffer: ReplyBuffer::new(),
            state: SessionState::AwaitGreeting,
        }
    }

    /// Current protocol state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Waits for the reply expected in the current state.
    ///
    /// # Errors
    ///
    /// See [`Session::expect`].
    pub async fn expect_current(&mut self) -> Result<Reply> {
        let accepted = self.state.expected();
        self.expect(accepted).await
    }

    /// Suspends until the next complete reply arrives and checks its code
    /// against `accepted`.
    ///
    /// Continuation lines (`250-...`) are absorbed; only a final line
    /// (`250 ...`) completes the reply. Bytes after the final line stay
    /// buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedReply`] with the raw final line if the
    /// code is not accepted, [`Error::ConnectionClosed`] if the peer hangs
    /// up first, or a framing error for malformed input.
    pub async fn expect(&mut self, accepted: &[ReplyCode]) -> Result<Reply> {
        if self.state.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let mut lines: Vec<String> = Vec::new();

        loop {
            while let Some(line) = self.buffer.next_line()? {
                if line.is_empty() {
                    continue;
                }
                trace!(state = %self.state, "S: {line}");

                let last = parse_line(&line)?.last;
                lines.push(line);
                if !last {
                    continue;
                }

                let reply = parse_reply(&lines)?;
                if reply.is_one_of(accepted) {
                    debug!(state = %self.state, code = %reply.code, "reply accepted");
                    return Ok(reply);
                }

                let line = lines.pop().unwrap_or_default();
                return Err(Error::UnexpectedReply {
                    state: self.state,
                    expected: accepted.to_vec(),
                    code: reply.code,
                    line,
                });
            }

            self.fill().await?;
        }
    }

    /// Writes `command` and waits for one of its accepted replies.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the reply is not accepted.
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        if self.state.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        debug!("C: {command}");
        self.write(&command.serialize()).await?;
        self.state = command.awaits();
        self.expect_current().await
    }

    /// Sends the message body after a 354 go-ahead, dot-stuffed and followed
    /// by the `.` terminator, and waits for the 250 acceptance.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the message is rejected.
    pub async fn send_message(&mut self, message: &[u8]) -> Result<Reply> {
        if self.state.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let payload = encode_data(message);
        debug!(bytes = payload.len(), "C: <message data>");
        self.write(&payload).await?;
        self.state = SessionState::AwaitDataAccepted;
        self.expect_current().await
    }

    /// Shuts the transport down. Safe to call more than once.
    ///
    /// Shutdown errors are logged and swallowed: the session is over either
    /// way, and the caller's own result must not be masked.
    pub async fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.state = SessionState::Closed;
        if let Err(err) = self.transport.shutdown().await {
            debug!(error = %err, "transport shutdown failed");
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write_all(data).await?;
        self.transport.flush().await?;
        Ok(())
    }

    async fn fill(&mut self) -> Result<()> {
        let read = self.transport.read_buf(self.buffer.read_target()).await?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Address;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_reply_split_across_reads_resolves_once() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        {
            let mut wait = task::spawn(session.expect(&[ReplyCode::OK]));
            assert_pending!(wait.poll());

            server.write_all(b"25").await.unwrap();
            assert!(wait.is_woken());
            assert_pending!(wait.poll());

            server.write_all(b"0 OK\r\n").await.unwrap();
            let reply = assert_ready!(wait.poll()).unwrap();
            assert_eq!(reply.code, ReplyCode::OK);
            assert_eq!(reply.message, vec!["OK"]);
        }

        // Nothing left over to satisfy a second wait.
        let mut again = task::spawn(session.expect(&[ReplyCode::OK]));
        assert_pending!(again.poll());
    }

    #[tokio::test]
    async fn test_multiline_reply_waits_for_final_line() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        let mut wait = task::spawn(session.expect(&[ReplyCode::OK]));
        server.write_all(b"250-Hello\r\n").await.unwrap();
        assert_pending!(wait.poll());

        server.write_all(b"250 OK\r\n").await.unwrap();
        let reply = assert_ready!(wait.poll()).unwrap();
        assert_eq!(reply.message, vec!["Hello", "OK"]);
    }

    #[tokio::test]
    async fn test_unexpected_code_carries_raw_line() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        server.write_all(b"550 Rejected\r\n").await.unwrap();
        let err = session.expect(&[ReplyCode::OK]).await.unwrap_err();

        assert!(err.to_string().contains("550 Rejected"));
        match err {
            Error::UnexpectedReply { code, line, .. } => {
                assert_eq!(code, ReplyCode::MAILBOX_UNAVAILABLE);
                assert_eq!(line, "550 Rejected");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replies_buffered_together_are_consumed_in_order() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        server
            .write_all(b"220 ready\r\n250-smtp.example.com\r\n250 AUTH LOGIN\r\n")
            .await
            .unwrap();

        let greeting = session.expect_current().await.unwrap();
        assert_eq!(greeting.code, ReplyCode::SERVICE_READY);

        let ehlo = session.expect(&[ReplyCode::OK]).await.unwrap();
        assert_eq!(ehlo.message, vec!["smtp.example.com", "AUTH LOGIN"]);
    }

    #[tokio::test]
    async fn test_execute_writes_command_and_tracks_state() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        server.write_all(b"251 will forward\r\n").await.unwrap();
        let cmd = Command::RcptTo {
            to: Address::new("b@example.com").unwrap(),
        };
        let reply = session.execute(&cmd).await.unwrap();
        assert_eq!(reply.code, ReplyCode::FORWARD);
        assert_eq!(session.state(), SessionState::AwaitRcptOk);

        let mut sent = vec![0u8; 64];
        let n = server.read(&mut sent).await.unwrap();
        assert_eq!(&sent[..n], b"RCPT TO:<b@example.com>\r\n");
    }

    #[tokio::test]
    async fn test_eof_is_connection_closed() {
        let (client, server) = duplex(1024);
        let mut session = Session::new(client);
        drop(server);

        let err = session.expect_current().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_malformed_line_is_rejected() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        server.write_all(b"hello there\r\n").await.unwrap();
        let err = session.expect_current().await.unwrap_err();
        assert!(matches!(err, Error::MalformedReply(_)));
    }

    #[tokio::test]
    async fn test_close_shuts_down_transport() {
        let (client, mut server) = duplex(1024);
        let mut session = Session::new(client);

        session.close().await;
        assert!(session.state().is_closed());

        let mut buf = [0u8; 8];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);

        let err = session.execute(&Command::Quit).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }
}
