//! Mock SMTP relay on a loopback socket.
//!
//! Accepts a single connection, answers each command with its configured
//! reply and records every line it receives. A DATA payload is
//! recorded as a single entry holding the raw (still dot-stuffed) lines.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;

#[derive(Debug, Clone)]
struct Replies {
    greeting: String,
    ehlo: String,
    auth_username: String,
    auth_password: String,
    auth_result: String,
    mail_from: String,
    rcpt_to: String,
    data: String,
    data_end: String,
    quit: String,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            greeting: "220 mock.relay ESMTP ready\r\n".to_string(),
            ehlo: "250-mock.relay\r\n250-AUTH LOGIN\r\n250 8BITMIME\r\n".to_string(),
            auth_username: "334 VXNlcm5hbWU6\r\n".to_string(),
            auth_password: "334 UGFzc3dvcmQ6\r\n".to_string(),
            auth_result: "235 2.7.0 Authentication successful\r\n".to_string(),
            mail_from: "250 2.1.0 OK\r\n".to_string(),
            rcpt_to: "250 2.1.5 OK\r\n".to_string(),
            data: "354 End data with <CR><LF>.<CR><LF>\r\n".to_string(),
            data_end: "250 2.0.0 Queued as 4F2A\r\n".to_string(),
            quit: "221 2.0.0 Bye\r\n".to_string(),
        }
    }
}

/// Running mock relay.
pub struct MockSmtpServer {
    addr: SocketAddr,
    received: Arc<RwLock<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockSmtpServer {
    /// Creates a builder with replies for a successful send.
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            replies: Replies::default(),
        }
    }

    /// Address the relay listens on.
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of accepted connections so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Waits until the client has closed its connection and returns the
    /// recorded lines. Panics if the client keeps the connection open.
    pub async fn finish(self) -> Vec<String> {
        timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("client did not close the connection")
            .expect("mock server task panicked");
        self.received.read().await.clone()
    }

    async fn serve(
        stream: TcpStream,
        replies: &Replies,
        received: &RwLock<Vec<String>>,
    ) -> std::io::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        writer.write_all(replies.greeting.as_bytes()).await?;
        if !replies.greeting.starts_with("220") {
            // Wait for the client to hang up
            let mut sink = String::new();
            while reader.read_line(&mut sink).await? > 0 {
                sink.clear();
            }
            return Ok(());
        }

        let mut auth_step = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let command = line.trim_end().to_string();
            received.write().await.push(command.clone());
            tracing::debug!("Mock relay received: {command}");

            let upper = command.to_ascii_uppercase();
            let reply = if auth_step == 1 {
                auth_step = 2;
                replies.auth_password.as_str()
            } else if auth_step == 2 {
                auth_step = 0;
                replies.auth_result.as_str()
            } else if upper.starts_with("EHLO") {
                replies.ehlo.as_str()
            } else if upper == "AUTH LOGIN" {
                auth_step = 1;
                replies.auth_username.as_str()
            } else if upper.starts_with("MAIL FROM:") {
                replies.mail_from.as_str()
            } else if upper.starts_with("RCPT TO:") {
                replies.rcpt_to.as_str()
            } else if upper == "DATA" {
                writer.write_all(replies.data.as_bytes()).await?;
                if !replies.data.starts_with("354") {
                    continue;
                }
                let mut payload = String::new();
                loop {
                    let mut data_line = String::new();
                    if reader.read_line(&mut data_line).await? == 0 {
                        return Ok(());
                    }
                    if data_line == ".\r\n" {
                        break;
                    }
                    payload.push_str(&data_line);
                }
                received.write().await.push(payload);
                replies.data_end.as_str()
            } else if upper == "QUIT" {
                replies.quit.as_str()
            } else {
                "500 5.5.2 Unrecognized command\r\n"
            };
            writer.write_all(reply.as_bytes()).await?;
        }
    }
}

/// Configures replies before starting the relay.
pub struct MockSmtpServerBuilder {
    replies: Replies,
}

impl MockSmtpServerBuilder {
    /// Replaces the greeting.
    pub fn with_greeting(mut self, reply: &str) -> Self {
        self.replies.greeting = reply.to_string();
        self
    }

    /// Replaces the reply to the password line.
    pub fn with_auth_result(mut self, reply: &str) -> Self {
        self.replies.auth_result = reply.to_string();
        self
    }

    /// Replaces the RCPT TO reply.
    pub fn with_rcpt_to_response(mut self, reply: &str) -> Self {
        self.replies.rcpt_to = reply.to_string();
        self
    }

    /// Replaces the reply after the message terminator.
    pub fn with_data_end_response(mut self, reply: &str) -> Self {
        self.replies.data_end = reply.to_string();
        self
    }

    /// Binds a loopback port and starts serving a single connection.
    pub async fn start(self) -> MockSmtpServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let received = Arc::new(RwLock::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let handle = {
            let received = Arc::clone(&received);
            let connections = Arc::clone(&connections);
            let replies = self.replies;
            tokio::spawn(async move {
                if let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    if let Err(e) = MockSmtpServer::serve(stream, &replies, &received).await {
                        tracing::debug!("Mock relay connection ended: {e}");
                    }
                }
            })
        };

        MockSmtpServer {
            addr,
            received,
            connections,
            handle,
        }
    }
}
