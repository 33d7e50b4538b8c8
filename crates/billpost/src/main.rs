//! `billpost` - send invoice emails from the command line
//!
//! Relay settings come from the `SMTP_*` environment variables.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use billpost_core::{InvoiceDocument, OutgoingMessage, SmtpConfig};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Send invoice emails through an SMTP relay
#[derive(Parser, Debug)]
#[command(name = "billpost")]
#[command(about = "Send invoice emails through an SMTP relay", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a plain message
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// File holding the plain text body
        #[arg(long)]
        text: PathBuf,

        /// File holding the HTML body (derived from the text when omitted)
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Render and send the email for an invoice document
    SendInvoice {
        /// JSON file with `invoice`, `client` and optional `settings`
        document: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billpost=info,billpost_core=info,billpost_smtp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = SmtpConfig::from_env()?;

    match cli.command {
        Commands::Send {
            to,
            subject,
            text,
            html,
        } => {
            let mut message = OutgoingMessage::new(to, subject, read_body(&text)?);
            if let Some(path) = html {
                message = message.html(read_body(&path)?);
            }
            billpost_core::send_email(&config, &message).await?;
            info!(to = %message.to, "Message delivered");
        }
        Commands::SendInvoice { document: path } => {
            let document = InvoiceDocument::from_json(&read_body(&path)?)
                .with_context(|| format!("invalid invoice document {}", path.display()))?;
            billpost_core::send_invoice(&config, &document).await?;
            info!(to = document.recipient()?, "Invoice delivered");
        }
    }

    Ok(())
}

fn read_body(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
