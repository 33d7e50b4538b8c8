//! MIME message structure and handling.
//!
//! A message is a tree of [`Part`]s. Leaves hold already-encoded body text;
//! multipart nodes hold their boundary and children. The same tree is used
//! for composing (rendered with `Display`) and for reading back a composed
//! message (built with [`Message::parse`]).

use crate::asset::InlineAsset;
use crate::content_type::ContentType;
use crate::encoding::{
    decode_base64, decode_quoted_printable, encode_base64_wrapped, encode_quoted_printable,
    is_7bit_safe, normalize_crlf,
};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            _ => Self::SevenBit, // 7bit, 8bit and binary all decode as is
        }
    }

    /// Picks the encoding for CRLF-normalized text: `7bit` when it is safe
    /// as is, Quoted-Printable otherwise.
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        if is_7bit_safe(text) {
            Self::SevenBit
        } else {
            Self::QuotedPrintable
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
        }
    }
}

/// Body of a MIME part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Encoded body text of a leaf part.
    Leaf(String),
    /// Child parts separated by `boundary`.
    Multipart {
        /// Boundary token (without the leading `--`).
        boundary: String,
        /// Child parts in order.
        parts: Vec<Part>,
    },
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(text) => f.write_str(text),
            Self::Multipart { boundary, parts } => {
                for part in parts {
                    write!(f, "--{boundary}\r\n{part}\r\n")?;
                }
                write!(f, "--{boundary}--")
            }
        }
    }
}

/// MIME message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body.
    pub body: Body,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Body) -> Self {
        Self { headers, body }
    }

    /// Creates a text leaf with `charset=utf-8`.
    ///
    /// Line endings are normalized to CRLF and the transfer encoding is
    /// chosen with [`TransferEncoding::for_text`].
    #[must_use]
    pub fn text(content_type: &ContentType, text: &str) -> Self {
        let normalized = normalize_crlf(text);
        let encoding = TransferEncoding::for_text(&normalized);
        let body = match encoding {
            TransferEncoding::QuotedPrintable => encode_quoted_printable(&normalized),
            _ => normalized,
        };

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", encoding.to_string());
        Self::new(headers, Body::Leaf(body))
    }

    /// Creates an inline leaf carrying the asset as wrapped Base64.
    #[must_use]
    pub fn inline(asset: &InlineAsset) -> Self {
        let content_type = asset
            .content_type()
            .clone()
            .with_parameter("name", asset.filename());

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string());
        headers.add("Content-ID", format!("<{}>", asset.content_id()));
        headers.add(
            "Content-Disposition",
            format!("inline; filename=\"{}\"", asset.filename()),
        );
        Self::new(headers, Body::Leaf(encode_base64_wrapped(asset.data())))
    }

    /// Creates a multipart node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] if `content_type` has no boundary
    /// parameter.
    pub fn multipart(content_type: &ContentType, parts: Vec<Self>) -> Result<Self> {
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        Ok(Self::new(
            headers,
            Body::Multipart {
                boundary: boundary.to_string(),
                parts,
            },
        ))
    }

    /// Parses a part from its raw text (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if the headers are malformed or a multipart body
    /// lacks its boundary or closing delimiter.
    pub fn parse(raw: &str) -> Result<Self> {
        let (header_text, body_text) = split_header_block(raw);
        let headers = Headers::parse(header_text)?;

        let content_type = content_type_of(&headers)?;
        let body = if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let parts = split_multipart(body_text, boundary)?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;
            Body::Multipart {
                boundary: boundary.to_string(),
                parts,
            }
        } else {
            Body::Leaf(body_text.to_string())
        };

        Ok(Self::new(headers, body))
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the child parts of a multipart node (empty for leaves).
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.body {
            Body::Leaf(_) => &[],
            Body::Multipart { parts, .. } => parts,
        }
    }

    /// Decodes a leaf body according to its transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart nodes or if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        let Body::Leaf(text) = &self.body else {
            return Err(Error::InvalidMultipart(
                "Multipart nodes have no leaf body".to_string(),
            ));
        };

        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(text),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(text)?.into_bytes()),
            TransferEncoding::SevenBit => Ok(text.clone().into_bytes()),
        }
    }

    /// Gets the decoded leaf body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or UTF-8 conversion fails.
    pub fn body_text(&self) -> Result<String> {
        String::from_utf8(self.decode_body()?).map_err(Into::into)
    }

    /// Finds the first part (depth-first, self included) with the given type.
    #[must_use]
    pub fn find(&self, main_type: &str, sub_type: &str) -> Option<&Self> {
        if self
            .content_type()
            .is_ok_and(|ct| ct.is(main_type, sub_type))
        {
            return Some(self);
        }
        self.parts().iter().find_map(|p| p.find(main_type, sub_type))
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.headers, self.body)
    }
}

/// A complete MIME message: the root part, whose headers carry the
/// top-level `From`/`To`/`Subject`/`Date`/`MIME-Version` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Wraps a root part whose headers are already complete.
    #[must_use]
    pub const fn new(root: Part) -> Self {
        Self { root }
    }

    /// Parses a rendered message.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block or multipart structure is invalid.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_suffix("\r\n").unwrap_or(text);
        Ok(Self::new(Part::parse(text)?))
    }

    /// Returns the root part.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Gets the top-level content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.root.content_type()
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers().get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers().get("to")
    }

    /// Gets the raw Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers().get("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers().get("date")
    }

    /// Finds the first text/plain part and decodes it.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        self.root
            .find("text", "plain")
            .ok_or_else(|| Error::MissingHeader("text/plain part".to_string()))?
            .body_text()
    }

    /// Finds the first text/html part and decodes it.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTML part is found or decoding fails.
    pub fn html_part(&self) -> Result<String> {
        self.root
            .find("text", "html")
            .ok_or_else(|| Error::MissingHeader("text/html part".to_string()))?
            .body_text()
    }

    /// Finds the leaf whose `Content-ID` is `<content_id>`.
    #[must_use]
    pub fn find_content_id(&self, content_id: &str) -> Option<&Part> {
        fn walk<'a>(part: &'a Part, wanted: &str) -> Option<&'a Part> {
            if part.headers.get("content-id") == Some(wanted) {
                return Some(part);
            }
            part.parts().iter().find_map(|p| walk(p, wanted))
        }
        walk(&self.root, &format!("<{content_id}>"))
    }
}

/// Renders the wire form: root headers, blank line, body, final CRLF.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.root)
    }
}

/// Splits a multipart body into the raw text of its parts.
///
/// Delimiter lines are `--boundary` and the closing `--boundary--`; the
/// line break before a delimiter belongs to the delimiter. Any preamble is
/// skipped and anything after the closing delimiter is ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidMultipart`] if the closing delimiter is missing.
pub fn split_multipart<'a>(body: &'a str, boundary: &str) -> Result<Vec<&'a str>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let Some(rest) = line.trim_end().strip_prefix(&delimiter) else {
            continue;
        };
        let closing = rest == "--";
        if !rest.is_empty() && !closing {
            continue;
        }

        if let Some(start) = start {
            let before = &body[..line_start];
            let end = before
                .strip_suffix("\r\n")
                .or_else(|| before.strip_suffix('\n'))
                .map_or(line_start, str::len);
            parts.push(&body[start..end.max(start)]);
        }

        if closing {
            return Ok(parts);
        }
        start = Some(offset);
    }

    Err(Error::InvalidMultipart(format!(
        "Missing closing delimiter for boundary '{boundary}'"
    )))
}

fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
}

fn split_header_block(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_prefix("\r\n") {
        return ("", body);
    }
    if let Some(index) = raw.find("\r\n\r\n") {
        return (&raw[..index + 2], &raw[index + 4..]);
    }
    if let Some(index) = raw.find("\n\n") {
        return (&raw[..index + 1], &raw[index + 2..]);
    }
    (raw, "")
}
