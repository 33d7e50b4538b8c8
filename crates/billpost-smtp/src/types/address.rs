//! Envelope address type.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates an email address (basic validation).
    ///
    /// Anything that would break out of the `<...>` path on the command
    /// line is rejected as well.
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "address contains forbidden characters: {addr:?}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr} must contain @")));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "{addr} must have exactly one @"
            )));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{addr}: local and domain parts cannot be empty"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
