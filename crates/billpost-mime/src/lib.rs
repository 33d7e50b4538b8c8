//! # billpost-mime
//!
//! Builds the MIME body of an outgoing email, byte for byte, without a
//! higher-level mail library.
//!
//! ## Features
//!
//! - **Alternative bodies**: `multipart/alternative` with `text/plain` first
//!   and `text/html` last
//! - **Inline assets**: an outer `multipart/related` carrying one image
//!   referenced from the HTML through `cid:`
//! - **Encodings**: Base64 wrapped at 76 columns, Quoted-Printable, RFC 2047
//!   encoded-words for headers
//! - **Boundaries**: one fresh token per nesting level, regenerated if it
//!   would collide with encoded content
//! - **Reading back**: a small multipart reader for inspecting composed
//!   messages
//!
//! ## Quick Start
//!
//! ```ignore
//! use billpost_mime::{ContentType, InlineAsset, MessageBuilder};
//!
//! let logo = InlineAsset::new(png_bytes, ContentType::new("image", "png"), "logo@billpost", "logo.png");
//!
//! let message = MessageBuilder::new()
//!     .from("Billing", "billing@example.com")
//!     .to("client@example.com")
//!     .subject("Invoice INV-0001")
//!     .text_body("Your invoice is ready.")
//!     .html_body(format!("<img src=\"{}\"><p>Your invoice is ready.</p>", logo.cid_uri()))
//!     .inline(logo)
//!     .build()?; // multipart/related wrapping multipart/alternative
//!
//! let wire = message.to_string();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod asset;
mod boundary;
mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use asset::InlineAsset;
pub use boundary::generate_boundary;
pub use builder::MessageBuilder;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, format_mailbox};
pub use message::{Body, Message, Part, TransferEncoding, split_multipart};
