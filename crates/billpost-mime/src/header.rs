//! MIME header handling.

use crate::encoding::{decode_rfc2047, encode_rfc2047};
use crate::error::{Error, Result};
use std::fmt;

/// Collection of email headers.
///
/// Headers render in insertion order; lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the first value for a header with RFC 2047 words decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoded-word is malformed.
    pub fn get_decoded(&self, name: &str) -> Result<Option<String>> {
        self.get(name).map(decode_rfc2047).transpose()
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a header block, stopping at the first empty line.
    ///
    /// Folded continuation lines (starting with space or tab) are joined to
    /// the previous header with a single space.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a header nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                let (_, value) = headers
                    .entries
                    .last_mut()
                    .ok_or_else(|| Error::InvalidHeader(format!("Orphan continuation: {line}")))?;
                value.push(' ');
                value.push_str(line.trim());
                continue;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
            headers.add(name.trim(), value.trim());
        }

        Ok(headers)
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

/// Rejects raw header input that could inject extra header lines.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if the value contains CR or LF.
pub(crate) fn check_header_value(field: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeader(format!(
            "{field} must not contain line breaks"
        )));
    }
    Ok(())
}

/// Formats a mailbox for `From`/`To` headers.
///
/// An empty display name yields the bare address. ASCII names are quoted
/// (embedded quotes and backslashes dropped); other names are RFC 2047
/// encoded.
///
/// # Errors
///
/// Returns an error if the name or address contains line breaks.
pub fn format_mailbox(name: &str, address: &str) -> Result<String> {
    check_header_value("display name", name)?;
    check_header_value("address", address)?;

    let name: String = name.chars().filter(|c| !matches!(c, '"' | '\\')).collect();
    let name = name.trim();

    if name.is_empty() {
        Ok(address.to_string())
    } else if name.is_ascii() {
        Ok(format!("\"{name}\" <{address}>"))
    } else {
        Ok(format!("{} <{address}>", encode_rfc2047(name, "utf-8")))
    }
}
