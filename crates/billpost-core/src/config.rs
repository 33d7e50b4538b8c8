//! SMTP relay configuration sourced from the environment.

use std::fmt;
use std::path::PathBuf;

use billpost_smtp::command::check_hostname;

use crate::error::{Result, SendError};

/// Default relay port (implicit TLS submission).
pub const DEFAULT_PORT: u16 = 465;

/// Default display name of the sender.
pub const DEFAULT_FROM_NAME: &str = "IMAGICITY";

/// Default identity sent with `EHLO`.
pub const DEFAULT_HELO_NAME: &str = "billpost.local";

/// Default location of the inline logo.
pub const DEFAULT_LOGO_PATH: &str = "public/logo.png";

/// SMTP relay settings for one send.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    /// Relay hostname, also the TLS server name.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Whether to negotiate TLS right after connecting.
    pub secure: bool,
    /// `AUTH LOGIN` username.
    pub username: String,
    /// `AUTH LOGIN` password.
    pub password: String,
    /// Envelope sender and `From` address.
    pub from_address: String,
    /// `From` display name.
    pub from_name: String,
    /// Client identity sent with `EHLO`.
    pub helo_name: String,
    /// Image embedded inline in invoice emails.
    pub logo_path: PathBuf,
}

impl SmtpConfig {
    /// Creates a config with defaults for everything but the relay and
    /// credentials.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            secure: true,
            from_address: username.clone(),
            username,
            password: password.into(),
            from_name: DEFAULT_FROM_NAME.to_string(),
            helo_name: DEFAULT_HELO_NAME.to_string(),
            logo_path: PathBuf::from(DEFAULT_LOGO_PATH),
        }
    }

    /// Reads the `SMTP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`] if `SMTP_HOST`, `SMTP_USER` or
    /// `SMTP_PASS` is missing, `SMTP_PORT` is not a port number, or
    /// `SMTP_HELO_NAME` is not a single hostname token.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as missing.
    ///
    /// # Errors
    ///
    /// See [`SmtpConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("SMTP_HOST");
        let username = get("SMTP_USER");
        let password = get("SMTP_PASS");

        let (Some(host), Some(username), Some(password)) = (host, username, password) else {
            let missing: Vec<&str> = ["SMTP_HOST", "SMTP_USER", "SMTP_PASS"]
                .into_iter()
                .filter(|key| get(*key).is_none())
                .collect();
            return Err(SendError::Configuration(format!(
                "missing {}",
                missing.join(", ")
            )));
        };

        let port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(|| {
                SendError::Configuration(format!("SMTP_PORT is not a valid port: {raw}"))
            })?,
            None => DEFAULT_PORT,
        };

        let secure = get("SMTP_SECURE").is_none_or(|raw| !raw.trim().eq_ignore_ascii_case("false"));

        let mut config = Self::new(host.trim(), username, password);
        config.port = port;
        config.secure = secure;
        if let Some(from) = get("SMTP_FROM") {
            config.from_address = from.trim().to_string();
        }
        if let Some(name) = get("SMTP_FROM_NAME") {
            config.from_name = name;
        }
        if let Some(helo) = get("SMTP_HELO_NAME") {
            let helo = helo.trim();
            check_hostname(helo).map_err(|_| {
                SendError::Configuration(format!("SMTP_HELO_NAME is not a hostname: {helo:?}"))
            })?;
            config.helo_name = helo.to_string();
        }
        if let Some(path) = get("SMTP_LOGO_PATH") {
            config.logo_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("helo_name", &self.helo_name)
            .field("logo_path", &self.logo_path)
            .finish()
    }
}
