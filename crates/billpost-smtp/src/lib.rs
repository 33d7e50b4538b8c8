//! # billpost-smtp
//!
//! A small SMTP submission client implementing the subset of RFC 5321 needed
//! to hand one message to an authenticating relay.
//!
//! ## Features
//!
//! - **Explicit reply state machine**: every command carries the reply codes
//!   it accepts, and the session waits for exactly one reply at a time
//! - **Fragmentation-proof framing**: replies are reassembled from arbitrary
//!   TCP chunks, multi-line replies (`250-...`) are absorbed until the final
//!   line
//! - **Type-state client**: out-of-order commands do not compile
//! - **Transports**: implicit TLS (port 465) or plaintext, no STARTTLS
//! - **Authentication**: `AUTH LOGIN`
//!
//! ## Quick Start
//!
//! ```ignore
//! use billpost_smtp::{Address, Client};
//! use billpost_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> billpost_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 465, true).await?;
//!     let client = Client::greet(stream).await?;
//!     let client = client.ehlo("billpost.local").await?;
//!     let client = client.auth_login("user", "password").await?;
//!
//!     let client = client.mail_from(Address::new("sender@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("recipient@example.com")?).await?;
//!     let client = client.data().await?;
//!
//!     let client = client.send_message(b"Subject: Test\r\n\r\nHello!\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Greeted ── ehlo() ──→ Ready ── auth_login() ──→ Authenticated
//!                                                     │
//!     ┌───────────────────── mail_from() ─────────────┘
//!     ▼
//! MailTransaction ── rcpt_to() ──→ RecipientAdded ── data() ──→ Data
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders and DATA encoding
//! - [`connection`]: transports, reply framing, session and type-state client
//! - [`parser`]: reply line parser
//! - [`types`]: core SMTP types (addresses, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::Command;
pub use connection::{
    Authenticated, Client, Data, Greeted, MailTransaction, Ready, RecipientAdded, ReplyBuffer,
    ServerInfo, Session, SessionState, SmtpStream,
};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyCode};
