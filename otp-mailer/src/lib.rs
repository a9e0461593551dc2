//! otp-mailer: one-time-passcode delivery over SMTP
//!
//! Speaks SMTP directly over an implicitly TLS-encrypted socket (SMTPS) to a
//! configured relay, without a higher-level mail library.
//!
//! # Features
//!
//! - **Transport**: TLS from the first byte, verified certificates, connect timeout
//! - **Protocol**: EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA, QUIT in lock-step
//! - **Framing**: multi-line replies, per-reply response timeout
//! - **Policy**: `log` or `smtp` provider, optional fallback to log mode
//!
//! # Example
//!
//! ```no_run
//! use otp_mailer::{MailerConfig, OneTimeCode, OtpMailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mailer = OtpMailer::new(MailerConfig::from_env()?);
//!     let otp = OneTimeCode::generate();
//!
//!     let result = mailer.send_otp_email("user@example.com", &otp.code).await?;
//!     println!("delivered: {}, mode: {:?}", result.delivered, result.mode);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading
//! - [`error`]: Error types
//! - [`transport`]: TLS channel establishment
//! - [`smtp`]: SMTP client protocol
//! - [`message`]: Message composition
//! - [`delivery`]: Delivery policy
//! - [`otp`]: Passcode generation

pub mod config;
pub mod delivery;
pub mod error;
pub mod message;
pub mod otp;
pub mod smtp;
pub mod transport;

// Re-export commonly used types
pub use config::{MailerConfig, SessionConfig, SmtpSettings};
pub use delivery::{DeliveryMode, DeliveryResult, MailProvider, OtpMailer};
pub use error::{MailerError, Result};
pub use message::OutboundMessage;
pub use otp::OneTimeCode;
pub use transport::{Connector, TlsTransport};
