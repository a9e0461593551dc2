//! SMTP reply framing
//!
//! A reply is one or more CRLF-terminated lines sharing a status code.
//! Continuation lines carry a hyphen after the code (`250-PIPELINING`), the
//! final line a space (`250 OK`). [`ResponseReader`] accumulates bytes until
//! the last complete line is a final line, within a per-reply timeout.
//! Relays that end lines with a bare LF are accepted too.

use crate::error::{MailerError, Result};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

const READ_CHUNK_SIZE: usize = 1024;

/// A complete server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    /// Status code of the final line
    pub code: u16,
    /// Raw reply text, all lines including their terminators
    pub text: String,
    /// Whether the reply ended with a final (`ddd `) line
    pub is_terminal: bool,
}

impl SmtpReply {
    /// Build a reply from raw text if its last non-empty line is a final line
    pub fn parse(text: &str) -> Option<Self> {
        let last = text.lines().filter(|line| !line.is_empty()).last()?;
        if !is_terminal_line(last) {
            return None;
        }

        Some(Self {
            code: last[..3].parse().ok()?,
            text: text.to_string(),
            is_terminal: true,
        })
    }

    /// Whether the status code is one of `expected`
    pub fn is_one_of(&self, expected: &[u16]) -> bool {
        expected.contains(&self.code)
    }

    /// Reply lines without their terminators
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().filter(|line| !line.is_empty())
    }
}

/// `^\d{3} `: three digits followed by a space
pub fn is_terminal_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' '
}

/// Reads whole replies from the incoming half of a channel
pub struct ResponseReader<R> {
    inner: R,
    buffer: Vec<u8>,
    timeout: Duration,
}

impl<R: AsyncRead + Unpin> ResponseReader<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            timeout,
        }
    }

    /// Wait for the next complete reply
    ///
    /// # Errors
    /// - [`MailerError::ResponseTimeout`] if no final line arrives in time;
    ///   anything buffered so far is discarded
    /// - [`MailerError::ConnectionClosed`] if the peer closes first
    pub async fn read_reply(&mut self) -> Result<SmtpReply> {
        match tokio::time::timeout(self.timeout, self.fill_until_complete()).await {
            Ok(result) => result,
            Err(_) => {
                self.buffer.clear();
                Err(MailerError::ResponseTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }

    async fn fill_until_complete(&mut self) -> Result<SmtpReply> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(reply) = self.take_reply() {
                return Ok(reply);
            }

            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                self.buffer.clear();
                return Err(MailerError::ConnectionClosed);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Only inspects the buffer at a line boundary, so a final line split
    /// across reads is never taken early
    fn take_reply(&mut self) -> Option<SmtpReply> {
        if !self.buffer.ends_with(b"\n") {
            return None;
        }

        let reply = SmtpReply::parse(&String::from_utf8_lossy(&self.buffer))?;
        for line in reply.lines() {
            debug!("< {}", line);
        }
        self.buffer.clear();
        Some(reply)
    }
}
