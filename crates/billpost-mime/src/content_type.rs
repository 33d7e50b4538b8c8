//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// Characters that force a parameter value into quotes (RFC 2045 tspecials).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
///
/// Parameters keep their insertion order so a composed header renders the
/// same way every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "png").
    pub sub_type: String,
    /// Parameters in order (e.g., charset=utf-8, boundary=xxx).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain; charset=utf-8` content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a `text/html; charset=utf-8` content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates a multipart/alternative content type with boundary.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "alternative").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/related content type with boundary.
    ///
    /// The `type` parameter names the root part (RFC 2387).
    #[must_use]
    pub fn multipart_related(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "related")
            .with_parameter("type", "multipart/alternative")
            .with_parameter("boundary", boundary)
    }

    /// Sets a parameter, replacing an existing one with the same name.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_ascii_lowercase();
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((key, value)),
        }
        self
    }

    /// Returns a parameter by (case-insensitive) name.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks the type and subtype, ignoring case.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type)
            && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in '{type_str}'")))?;

        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(type_str.to_string()));
        }

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());

        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                let value = value.trim().trim_matches('"');
                content_type = content_type.with_parameter(key.trim(), value);
            }
        }

        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            if value.is_empty()
                || value.contains(|c: char| c.is_whitespace() || TSPECIALS.contains(c))
            {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}
