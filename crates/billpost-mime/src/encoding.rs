//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length for Base64 and Quoted-Printable (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Maximum line length of an unencoded 7bit body (RFC 5322).
const MAX_7BIT_LINE: usize = 998;

/// Input bytes per RFC 2047 encoded-word; keeps each word under 75 chars.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 for a MIME body: hard-wrapped at 76 characters
/// with CRLF line breaks and no trailing break.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is ASCII, so byte chunks are char boundaries
    for (i, line) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            wrapped.push_str("\r\n");
        }
        wrapped.push_str(&String::from_utf8_lossy(line));
    }

    wrapped
}

/// Decodes Base64 data, ignoring line breaks and other whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Normalizes every line ending (`\n`, `\r\n`, lone `\r`) to CRLF.
#[must_use]
pub fn normalize_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 32);
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            _ => out.push(ch),
        }
    }

    out
}

/// Returns true if CRLF-normalized `text` can be sent as `7bit` as is.
#[must_use]
pub fn is_7bit_safe(text: &str) -> bool {
    text.is_ascii()
        && !text.contains('\0')
        && text.split("\r\n").all(|line| line.len() <= MAX_7BIT_LINE)
}

/// Escapes `&`, `<`, `>`, `"` and `'` for embedding text in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// `CRLF` line breaks are kept as hard breaks; longer lines get soft breaks
/// (`=` CRLF) so no encoded line exceeds 76 characters. Whitespace at the
/// end of a line is encoded so transports cannot strip it.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);

    for (i, line) in text.split("\r\n").enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }

        let bytes = line.as_bytes();
        let mut line_length = 0;

        for (pos, &byte) in bytes.iter().enumerate() {
            let at_line_end = pos + 1 == bytes.len();
            let literal = match byte {
                b'!'..=b'<' | b'>'..=b'~' => true,
                b' ' | b'\t' => !at_line_end,
                _ => false,
            };
            let width = if literal { 1 } else { 3 };

            // Leave room for the trailing '=' of a soft break
            if line_length + width > MAX_LINE_LENGTH - 1 {
                result.push_str("=\r\n");
                line_length = 0;
            }

            if literal {
                result.push(byte as char);
            } else {
                let _ = write!(result, "={byte:02X}");
            }
            line_length += width;
        }
    }

    result
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences or the
/// decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let mut result = Vec::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1..i + 3) {
            Some(b"\r\n") => {
                i += 3;
                continue;
            }
            Some([b'\n', _]) => {
                i += 2;
                continue;
            }
            _ => {}
        }
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        // Hex encoded byte
        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|_| Error::InvalidEncoding("Invalid escape sequence".to_string()))?;
        let value = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(value);
        i += 3;
    }

    String::from_utf8(result).map_err(Into::into)
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Long values are split into several
/// encoded-words, folded onto continuation lines.
///
/// # Arguments
///
/// * `text` - Text to encode
/// * `charset` - Character set (e.g., "utf-8")
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    // Only encode if necessary
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join("\r\n ")
}

/// Decodes an RFC 2047 encoded header value.
///
/// Encoded-words may be mixed with plain text; whitespace between two
/// adjacent encoded-words is dropped as the RFC requires.
///
/// # Errors
///
/// Returns an error if an encoded-word is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut out = String::new();
    let mut previous_was_word = false;

    for token in text.split_whitespace() {
        let is_word = token.starts_with("=?") && token.ends_with("?=") && token.len() > 4;
        if !out.is_empty() && !(is_word && previous_was_word) {
            out.push(' ');
        }
        if is_word {
            out.push_str(&decode_encoded_word(token)?);
        } else {
            out.push_str(token);
        }
        previous_was_word = is_word;
    }

    Ok(out)
}

fn decode_encoded_word(word: &str) -> Result<String> {
    let inner = &word[2..word.len() - 2];
    let parts: Vec<&str> = inner.split('?').collect();

    if parts.len() != 3 {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    }

    let encoding = parts[1].to_uppercase();
    let encoded_text = parts[2];

    match encoding.as_str() {
        "B" => {
            let decoded = decode_base64(encoded_text)?;
            String::from_utf8(decoded).map_err(Into::into)
        }
        "Q" => {
            // Quoted-Printable (with underscore for space)
            let text_with_spaces = encoded_text.replace('_', " ");
            decode_quoted_printable(&text_with_spaces)
        }
        _ => Err(Error::InvalidEncoding(format!(
            "Unknown encoding: {encoding}"
        ))),
    }
}
