//! OTP delivery policy
//!
//! Picks the provider from configuration on every call:
//! - `log`: record the passcode locally, nothing leaves the process
//! - `smtp`: run an [`SmtpSession`]; on failure either propagate the error or,
//!   when `fallback_to_log_on_error` is set, record locally instead

use crate::config::{ensure_single_line, MailerConfig};
use crate::error::{MailerError, Result};
use crate::message::OutboundMessage;
use crate::smtp::SmtpSession;
use crate::transport::{Connector, TlsTransport};
use serde::Serialize;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Configured delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Log,
    Smtp,
}

impl FromStr for MailProvider {
    type Err = MailerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(MailProvider::Log),
            "smtp" => Ok(MailProvider::Smtp),
            other => Err(MailerError::Config(format!(
                "Unsupported MAIL_PROVIDER: {}",
                other
            ))),
        }
    }
}

/// How the passcode ended up being handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Log,
    Smtp,
}

/// Outcome reported to the calling flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub delivered: bool,
    pub mode: DeliveryMode,
}

impl DeliveryResult {
    pub fn logged() -> Self {
        Self {
            delivered: false,
            mode: DeliveryMode::Log,
        }
    }

    pub fn sent() -> Self {
        Self {
            delivered: true,
            mode: DeliveryMode::Smtp,
        }
    }
}

/// Sends one-time passcodes according to [`MailerConfig`]
///
/// # Examples
/// ```no_run
/// use otp_mailer::{MailerConfig, OtpMailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = OtpMailer::new(MailerConfig::from_env()?);
/// let result = mailer.send_otp_email("user@example.com", "482913").await?;
/// println!("delivered: {}", result.delivered);
/// # Ok(())
/// # }
/// ```
pub struct OtpMailer<C = TlsTransport> {
    config: MailerConfig,
    connector: C,
}

impl OtpMailer<TlsTransport> {
    pub fn new(config: MailerConfig) -> Self {
        Self::with_connector(config, TlsTransport::new())
    }
}

impl<C: Connector> OtpMailer<C> {
    /// Mailer opening its channels through `connector`
    pub fn with_connector(config: MailerConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Deliver `otp` to `email`
    ///
    /// # Errors
    /// - Always: an unsupported provider, before any network activity
    /// - Only with fallback disabled: any SMTP session failure, including
    ///   missing SMTP settings
    pub async fn send_otp_email(&self, email: &str, otp: &str) -> Result<DeliveryResult> {
        match self.config.provider.parse::<MailProvider>()? {
            MailProvider::Log => {
                record_locally(email, otp);
                Ok(DeliveryResult::logged())
            }
            MailProvider::Smtp => match self.send_with_smtp(email, otp).await {
                Ok(()) => Ok(DeliveryResult::sent()),
                Err(e) if self.config.fallback_to_log_on_error => {
                    error!("SMTP send failed, falling back to log mode: {}", e);
                    record_locally(email, otp);
                    Ok(DeliveryResult::logged())
                }
                Err(e) => Err(e),
            },
        }
    }

    async fn send_with_smtp(&self, email: &str, otp: &str) -> Result<()> {
        let session_config = self.config.smtp.resolve()?;
        ensure_single_line("recipient address", email)?;
        let message = OutboundMessage::otp(email, otp);

        SmtpSession::new(&session_config, &self.connector)
            .deliver(&message)
            .await?;

        if !session_config.secure {
            warn!("SMTP_SECURE is disabled, but this sender always uses implicit TLS (SMTPS, port 465)");
        }

        Ok(())
    }
}

fn record_locally(email: &str, otp: &str) {
    info!(email = %email, otp = %otp, "OTP for {}: {}", email, otp);
}
