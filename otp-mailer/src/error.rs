use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("SMTP response timeout after {}ms", .timeout.as_millis())]
    ResponseTimeout { timeout: Duration },

    #[error("SMTP command failed for \"{command}\": {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("SMTP connection closed by server before a complete reply")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MailerError>;
