//! Mailer configuration
//!
//! Settings use flat keys. They are read from an optional TOML file and then
//! overridden by environment variables of the same upper-case name
//! (`smtp_host` in the file, `SMTP_HOST` in the environment).
//!
//! ```toml
//! mail_provider = "smtp"
//! smtp_host = "smtp.example.com"
//! smtp_user = "mailer"
//! smtp_pass = "secret"
//! mail_from = "no-reply@example.com"
//! ```

use crate::error::{MailerError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PROVIDER: &str = "log";
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CLIENT_NAME: &str = "planner-backend";
pub const DEFAULT_SENDER_NAME: &str = "Planner";

/// Top-level mailer configuration
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Delivery provider name (`log` or `smtp`), validated on each send
    pub provider: String,
    /// Downgrade to log mode instead of failing when SMTP delivery fails
    pub fallback_to_log_on_error: bool,
    pub smtp: SmtpSettings,
}

/// SMTP settings as configured; required values may still be missing
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub from_name: String,
    pub client_name: String,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    /// Informational only: the sender always connects with implicit TLS
    pub secure: bool,
}

/// Fully resolved settings for a single SMTP session
#[derive(Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub sender_name: String,
    pub client_name: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub secure: bool,
}

/// Raw key/value view shared by the file and environment sources
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    mail_provider: Option<String>,
    mail_fallback_to_log_on_error: Option<String>,
    app_env: Option<String>,
    smtp_host: Option<String>,
    smtp_port: Option<String>,
    smtp_user: Option<String>,
    smtp_pass: Option<String>,
    mail_from: Option<String>,
    mail_from_name: Option<String>,
    smtp_client_name: Option<String>,
    smtp_connect_timeout_ms: Option<String>,
    smtp_response_timeout_ms: Option<String>,
    smtp_secure: Option<String>,
}

impl MailerConfig {
    /// Load from the process environment only
    pub fn from_env() -> Result<Self> {
        Self::from_sources(None, None)
    }

    /// Load from a TOML file, with the process environment taking precedence
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_sources(Some(path), None)
    }

    /// Load from an optional TOML file and an environment map
    ///
    /// When `env` is `None` the process environment is used.
    pub fn from_sources(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading mailer configuration from {:?}", path);
            builder = builder.add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Toml,
            ));
        }

        let raw: RawSettings = builder
            .add_source(config::Environment::default().source(env))
            .build()
            .map_err(|e| MailerError::Config(format!("Failed to read configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| MailerError::Config(format!("Failed to parse configuration: {}", e)))?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let production = raw.app_env.as_deref() == Some("production");

        Ok(Self {
            provider: raw
                .mail_provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            fallback_to_log_on_error: parse_flag(
                raw.mail_fallback_to_log_on_error.as_deref(),
                !production,
            ),
            smtp: SmtpSettings {
                host: raw.smtp_host,
                port: parse_number("SMTP_PORT", raw.smtp_port.as_deref(), DEFAULT_SMTP_PORT)?,
                username: raw.smtp_user,
                password: raw.smtp_pass,
                from: raw.mail_from,
                from_name: raw
                    .mail_from_name
                    .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
                client_name: raw
                    .smtp_client_name
                    .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string()),
                connect_timeout_ms: parse_number(
                    "SMTP_CONNECT_TIMEOUT_MS",
                    raw.smtp_connect_timeout_ms.as_deref(),
                    DEFAULT_CONNECT_TIMEOUT_MS,
                )?,
                response_timeout_ms: parse_number(
                    "SMTP_RESPONSE_TIMEOUT_MS",
                    raw.smtp_response_timeout_ms.as_deref(),
                    DEFAULT_RESPONSE_TIMEOUT_MS,
                )?,
                secure: parse_flag(raw.smtp_secure.as_deref(), true),
            },
        })
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            fallback_to_log_on_error: true,
            smtp: SmtpSettings::default(),
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from: None,
            from_name: DEFAULT_SENDER_NAME.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            secure: true,
        }
    }
}

impl SmtpSettings {
    /// Resolve into a session configuration, failing if a required value is missing
    pub fn resolve(&self) -> Result<SessionConfig> {
        let required = [
            ("SMTP_HOST", &self.host),
            ("SMTP_USER", &self.username),
            ("SMTP_PASS", &self.password),
            ("MAIL_FROM", &self.from),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(key, _)| *key)
            .collect();

        if !missing.is_empty() {
            return Err(MailerError::Config(format!(
                "SMTP is not fully configured. Missing {}",
                missing.join("/")
            )));
        }

        let sender = self.from.clone().unwrap_or_default();
        ensure_single_line("MAIL_FROM", &sender)?;
        ensure_single_line("MAIL_FROM_NAME", &self.from_name)?;
        ensure_single_line("SMTP_CLIENT_NAME", &self.client_name)?;

        Ok(SessionConfig {
            host: self.host.clone().unwrap_or_default(),
            port: self.port,
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            sender,
            sender_name: self.from_name.clone(),
            client_name: self.client_name.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            secure: self.secure,
        })
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("from_name", &self.from_name)
            .field("client_name", &self.client_name)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("response_timeout_ms", &self.response_timeout_ms)
            .field("secure", &self.secure)
            .finish()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("sender", &self.sender)
            .field("sender_name", &self.sender_name)
            .field("client_name", &self.client_name)
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Only `true` and `1` are truthy; an absent value takes the default
fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(value) => value == "true" || value == "1",
    }
}

/// Reject values that would end an SMTP command or header line early
pub(crate) fn ensure_single_line(key: &str, value: &str) -> Result<()> {
    if value.contains(|c: char| c == '\r' || c == '\n') {
        return Err(MailerError::Config(format!(
            "{} must not contain line breaks",
            key
        )));
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &str, value: Option<&str>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| MailerError::Config(format!("Invalid value for {}: {:?}", key, value))),
    }
}
