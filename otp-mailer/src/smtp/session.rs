//! SMTP submission session
//!
//! One session delivers one message over one channel:
//!
//! ```text
//! Connect → Greeting(220) → EHLO(250) → AUTH LOGIN(334) → user(334) → pass(235)
//!         → MAIL FROM(250) → RCPT TO(250|251) → DATA(354) → payload(250) → QUIT(221)
//!         → Close
//! ```
//!
//! A failed check at any state skips every later state and goes straight to
//! Close. There are no retries within a session.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::message::OutboundMessage;
use crate::smtp::{SmtpClient, SmtpCommand};
use crate::transport::Connector;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

/// Session states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connect,
    Greeting,
    Ehlo,
    Auth,
    MailFrom,
    RcptTo,
    Data,
    Payload,
    Quit,
    Close,
}

/// A single delivery attempt against the configured relay
pub struct SmtpSession<'a, C> {
    config: &'a SessionConfig,
    connector: &'a C,
}

impl<'a, C: Connector> SmtpSession<'a, C> {
    pub fn new(config: &'a SessionConfig, connector: &'a C) -> Self {
        Self { config, connector }
    }

    /// Deliver `message`, closing the channel on every path once it is open
    pub async fn deliver(&self, message: &OutboundMessage) -> Result<()> {
        info!(
            "Sending mail to {} via {}:{}",
            message.recipient, self.config.host, self.config.port
        );

        let stream = self.connector.connect(self.config).await.map_err(|e| {
            warn!(state = ?SessionState::Connect, "SMTP session aborted: {}", e);
            e
        })?;

        let mut client = SmtpClient::new(stream, self.config.response_timeout);
        let mut state = SessionState::Greeting;
        let result = self.exchange(&mut client, message, &mut state).await;
        client.close().await;

        match &result {
            Ok(()) => info!("Mail sent successfully to {}", message.recipient),
            Err(e) => warn!(state = ?state, "SMTP session aborted: {}", e),
        }

        result
    }

    async fn exchange<S>(
        &self,
        client: &mut SmtpClient<S>,
        message: &OutboundMessage,
        state: &mut SessionState,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        client.read_greeting().await?;

        *state = SessionState::Ehlo;
        client
            .send_command(&SmtpCommand::Ehlo(self.config.client_name.clone()))
            .await?;

        *state = SessionState::Auth;
        client.send_command(&SmtpCommand::AuthLogin).await?;
        client
            .send_command(&SmtpCommand::auth_username(&self.config.username))
            .await?;
        client
            .send_command(&SmtpCommand::auth_password(&self.config.password))
            .await?;

        *state = SessionState::MailFrom;
        client
            .send_command(&SmtpCommand::MailFrom(self.config.sender.clone()))
            .await?;

        *state = SessionState::RcptTo;
        client
            .send_command(&SmtpCommand::RcptTo(message.recipient.clone()))
            .await?;

        *state = SessionState::Data;
        client.send_command(&SmtpCommand::Data).await?;

        *state = SessionState::Payload;
        client
            .send_data(&message.to_data(&self.config.sender_name, &self.config.sender))
            .await?;

        *state = SessionState::Quit;
        client.send_command(&SmtpCommand::Quit).await?;

        *state = SessionState::Close;
        Ok(())
    }
}
