//! SMTP submission client (RFC 5321 subset)
//!
//! - [`response`]: reply framing and the timed response reader
//! - [`commands`]: client commands and their expected reply codes
//! - [`client`]: lock-step command/response driver
//! - [`session`]: the submission state machine

pub mod client;
pub mod commands;
pub mod response;
pub mod session;

pub use client::SmtpClient;
pub use commands::SmtpCommand;
pub use response::{ResponseReader, SmtpReply};
pub use session::{SessionState, SmtpSession};
