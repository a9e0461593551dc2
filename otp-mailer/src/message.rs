//! Outbound message composition
//!
//! Messages are a single `text/html` part followed by a plain-text fallback
//! line. This is not a `multipart/alternative` structure; HTML-capable
//! clients render the markup and the trailing text line alike.

use crate::otp::OTP_TTL_MINUTES;

/// A message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutboundMessage {
    /// Email verification message carrying a one-time passcode
    pub fn otp(recipient: &str, otp: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: "Verify your email - Planner OTP".to_string(),
            text_body: format!(
                "Your OTP is {}. It will expire in {} minutes.",
                otp, OTP_TTL_MINUTES
            ),
            html_body: format!(
                "<p>Your OTP is <strong>{}</strong>.</p><p>It will expire in {} minutes.</p>",
                otp, OTP_TTL_MINUTES
            ),
        }
    }

    /// Render headers and body for the DATA phase
    ///
    /// Lines are CRLF-joined and dot-stuffed. The result carries no trailing
    /// CRLF and no `.` terminator; the client appends `\r\n.\r\n`.
    pub fn to_data(&self, sender_name: &str, sender: &str) -> String {
        let headers = [
            format!("From: {} <{}>", sender_name, sender),
            format!("To: <{}>", self.recipient),
            format!("Subject: {}", self.subject),
            "MIME-Version: 1.0".to_string(),
            "Content-Type: text/html; charset=UTF-8".to_string(),
        ];

        let mut lines: Vec<String> = headers.into_iter().collect();
        lines.push(String::new());
        lines.extend(body_lines(&self.html_body));
        lines.push(String::new());
        lines.extend(body_lines(&self.text_body));

        lines.join("\r\n")
    }
}

/// Normalize line endings and escape leading dots (RFC 5321 4.5.2)
fn body_lines(body: &str) -> impl Iterator<Item = String> + '_ {
    body.lines().map(|line| {
        if line.starts_with('.') {
            format!(".{}", line)
        } else {
            line.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_message() {
        let message = OutboundMessage::otp("user@example.com", "482913");
        assert_eq!(message.recipient, "user@example.com");
        assert_eq!(message.subject, "Verify your email - Planner OTP");
        assert_eq!(
            message.text_body,
            "Your OTP is 482913. It will expire in 10 minutes."
        );
        assert!(message.html_body.contains("<strong>482913</strong>"));
    }

    #[test]
    fn test_data_layout() {
        let message = OutboundMessage::otp("user@example.com", "482913");
        let data = message.to_data("Planner", "no-reply@example.com");

        let expected = [
            "From: Planner <no-reply@example.com>",
            "To: <user@example.com>",
            "Subject: Verify your email - Planner OTP",
            "MIME-Version: 1.0",
            "Content-Type: text/html; charset=UTF-8",
            "",
            "<p>Your OTP is <strong>482913</strong>.</p><p>It will expire in 10 minutes.</p>",
            "",
            "Your OTP is 482913. It will expire in 10 minutes.",
        ]
        .join("\r\n");

        assert_eq!(data, expected);
        assert!(!data.ends_with("\r\n"));
    }

    #[test]
    fn test_dot_stuffing() {
        let message = OutboundMessage {
            recipient: "user@example.com".to_string(),
            subject: "Dots".to_string(),
            text_body: "first\n.\n..two".to_string(),
            html_body: "<p>ok</p>".to_string(),
        };

        let data = message.to_data("Planner", "no-reply@example.com");
        assert!(data.ends_with("first\r\n..\r\n...two"));
        assert!(!data.contains("\r\n.\r\n"));
    }
}
