//! Lock-step command/response driver
//!
//! [`SmtpClient`] owns one channel. Every call writes at most one command and
//! waits for exactly one reply before returning, so a command is never sent
//! while a reply is outstanding.

use crate::error::{MailerError, Result};
use crate::smtp::response::{ResponseReader, SmtpReply};
use crate::smtp::SmtpCommand;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tracing::{debug, error, warn};

/// SMTP client driving a single channel
pub struct SmtpClient<S> {
    reader: ResponseReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    response_timeout: Duration,
    closed: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> SmtpClient<S> {
    /// Wrap an established channel; `response_timeout` bounds each reply
    pub fn new(stream: S, response_timeout: Duration) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: ResponseReader::new(reader, response_timeout),
            writer,
            response_timeout,
            closed: false,
        }
    }

    /// Read the server banner, requiring `220`
    pub async fn read_greeting(&mut self) -> Result<SmtpReply> {
        self.expect_reply("<greeting>", &[220]).await
    }

    /// Send one command and check the reply against its expected codes
    pub async fn send_command(&mut self, command: &SmtpCommand) -> Result<SmtpReply> {
        debug!("> {}", command);
        self.write_line(&command.line()).await?;
        self.expect_reply(&command.to_string(), command.expected_codes())
            .await
    }

    /// Stream an already dot-stuffed message and its terminator, requiring `250`
    pub async fn send_data(&mut self, data: &str) -> Result<SmtpReply> {
        debug!("> <message data, {} bytes>", data.len());
        self.writer.write_all(data.as_bytes()).await?;
        self.writer.write_all(b"\r\n.\r\n").await?;
        self.writer.flush().await?;
        self.expect_reply("<message data>", &[250]).await
    }

    /// Close the channel; later calls do nothing
    ///
    /// Teardown errors are logged, never returned, so the error that ended
    /// the session is the one reported.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match tokio::time::timeout(self.response_timeout, self.writer.shutdown()).await {
            Ok(Ok(())) => debug!("SMTP channel closed"),
            Ok(Err(e)) => warn!("Error while closing SMTP channel: {}", e),
            Err(_) => warn!(
                "Timed out closing SMTP channel after {}ms",
                self.response_timeout.as_millis()
            ),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn expect_reply(&mut self, command: &str, expected: &[u16]) -> Result<SmtpReply> {
        let reply = self.reader.read_reply().await?;

        if !reply.is_one_of(expected) {
            error!("Unexpected reply to {}: {}", command, reply.text.trim_end());
            return Err(MailerError::UnexpectedReply {
                command: command.to_string(),
                reply: reply.text,
            });
        }

        Ok(reply)
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
