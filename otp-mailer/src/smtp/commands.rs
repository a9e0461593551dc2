use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fmt;

/// Client commands, in the order a submission session sends them
#[derive(Clone, PartialEq)]
pub enum SmtpCommand {
    Ehlo(String),
    AuthLogin,
    /// Base64-encoded username
    AuthUsername(String),
    /// Base64-encoded password
    AuthPassword(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    Quit,
}

impl SmtpCommand {
    pub fn auth_username(username: &str) -> Self {
        SmtpCommand::AuthUsername(BASE64.encode(username))
    }

    pub fn auth_password(password: &str) -> Self {
        SmtpCommand::AuthPassword(BASE64.encode(password))
    }

    /// Wire form, without the CRLF terminator
    pub fn line(&self) -> String {
        match self {
            SmtpCommand::Ehlo(name) => format!("EHLO {}", name),
            SmtpCommand::AuthLogin => "AUTH LOGIN".to_string(),
            SmtpCommand::AuthUsername(encoded) | SmtpCommand::AuthPassword(encoded) => {
                encoded.clone()
            }
            SmtpCommand::MailFrom(address) => format!("MAIL FROM:<{}>", address),
            SmtpCommand::RcptTo(address) => format!("RCPT TO:<{}>", address),
            SmtpCommand::Data => "DATA".to_string(),
            SmtpCommand::Quit => "QUIT".to_string(),
        }
    }

    /// Reply codes that let the session move on
    pub fn expected_codes(&self) -> &'static [u16] {
        match self {
            SmtpCommand::Ehlo(_) => &[250],
            SmtpCommand::AuthLogin | SmtpCommand::AuthUsername(_) => &[334],
            SmtpCommand::AuthPassword(_) => &[235],
            SmtpCommand::MailFrom(_) => &[250],
            SmtpCommand::RcptTo(_) => &[250, 251],
            SmtpCommand::Data => &[354],
            SmtpCommand::Quit => &[221],
        }
    }
}

/// Same as [`SmtpCommand::line`] with credentials masked; safe for logs and errors
impl fmt::Display for SmtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtpCommand::AuthUsername(_) => f.write_str("<auth username>"),
            SmtpCommand::AuthPassword(_) => f.write_str("<auth password>"),
            other => f.write_str(&other.line()),
        }
    }
}

impl fmt::Debug for SmtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SmtpCommand({})", self)
    }
}
