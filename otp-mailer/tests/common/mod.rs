//! Shared helpers: a scripted SMTP server and in-memory connectors
#![allow(dead_code)]

use async_trait::async_trait;
use otp_mailer::{Connector, MailerConfig, MailerError, Result, SessionConfig, SmtpSettings};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf,
};
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Replies of a relay accepting everything, greeting first
pub const HAPPY_PATH_REPLIES: [&str; 10] = [
    "220 smtp.example.com ESMTP ready\r\n",
    "250-smtp.example.com\r\n250-AUTH LOGIN PLAIN\r\n250 8BITMIME\r\n",
    "334 VXNlcm5hbWU6\r\n",
    "334 UGFzc3dvcmQ6\r\n",
    "235 2.7.0 Authentication successful\r\n",
    "250 2.1.0 Ok\r\n",
    "250 2.1.5 Ok\r\n",
    "354 End data with <CR><LF>.<CR><LF>\r\n",
    "250 2.0.0 Ok: queued\r\n",
    "221 2.0.0 Bye\r\n",
];

/// What the scripted server saw
#[derive(Debug, Default)]
pub struct Transcript {
    /// Command lines without CRLF, in order
    pub commands: Vec<String>,
    /// Message data received after `354`, without the `.` terminator
    pub data: Option<String>,
    /// Whether the client closed the channel
    pub saw_eof: bool,
}

pub fn script(replies: &[&str]) -> Vec<String> {
    replies.iter().map(|reply| reply.to_string()).collect()
}

/// Play `replies` against one client: the first on connect, then one per
/// command (and one after the message data). Once replies run out the server
/// keeps reading silently until the client closes.
pub async fn serve_script<S>(stream: S, replies: Vec<String>) -> Transcript
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    let mut replies = replies.into_iter();
    let mut transcript = Transcript::default();

    if let Some(greeting) = replies.next() {
        if stream.get_mut().write_all(greeting.as_bytes()).await.is_err() {
            return transcript;
        }
    }

    loop {
        let Some(line) = read_line(&mut stream).await else {
            transcript.saw_eof = true;
            return transcript;
        };
        let command = line.trim_end_matches("\r\n").to_string();
        transcript.commands.push(command.clone());

        let Some(reply) = replies.next() else {
            continue;
        };
        if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
            return transcript;
        }

        if command == "DATA" && reply.starts_with("354") {
            let mut data = String::new();
            loop {
                let Some(line) = read_line(&mut stream).await else {
                    transcript.data = Some(data);
                    transcript.saw_eof = true;
                    return transcript;
                };
                if line == ".\r\n" {
                    break;
                }
                data.push_str(&line);
            }
            transcript.data = Some(data);

            if let Some(reply) = replies.next() {
                if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                    return transcript;
                }
            }
        }
    }
}

async fn read_line<S: AsyncRead + Unpin>(stream: &mut BufReader<S>) -> Option<String> {
    let mut line = String::new();
    match stream.read_line(&mut line).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// Stream wrapper counting completed shutdowns
pub struct TrackedStream<S> {
    inner: S,
    shutdowns: Arc<AtomicUsize>,
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let result = Pin::new(&mut self.inner).poll_shutdown(cx);
        if result.is_ready() {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

/// Hands out one pre-connected in-memory stream
pub struct MockConnector {
    stream: Mutex<Option<TrackedStream<DuplexStream>>>,
    pub connects: AtomicUsize,
}

#[async_trait]
impl Connector for MockConnector {
    type Stream = TrackedStream<DuplexStream>;

    async fn connect(&self, config: &SessionConfig) -> Result<Self::Stream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MailerError::Connect {
                host: config.host.clone(),
                port: config.port,
                reason: "mock stream already used".to_string(),
            })
    }
}

/// Connector whose every attempt fails
#[derive(Default)]
pub struct RefusingConnector {
    pub connects: AtomicUsize,
}

#[async_trait]
impl Connector for RefusingConnector {
    type Stream = DuplexStream;

    async fn connect(&self, config: &SessionConfig) -> Result<Self::Stream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(MailerError::Connect {
            host: config.host.clone(),
            port: config.port,
            reason: "Connection refused".to_string(),
        })
    }
}

/// A connected mock relay
pub struct ScriptedRelay {
    pub connector: MockConnector,
    pub shutdowns: Arc<AtomicUsize>,
    pub server: JoinHandle<Transcript>,
}

impl ScriptedRelay {
    pub fn start(replies: Vec<String>) -> Self {
        let (client, server) = tokio::io::duplex(16 * 1024);
        let shutdowns = Arc::new(AtomicUsize::new(0));

        let stream = TrackedStream {
            inner: client,
            shutdowns: shutdowns.clone(),
        };

        Self {
            connector: MockConnector {
                stream: Mutex::new(Some(stream)),
                connects: AtomicUsize::new(0),
            },
            shutdowns,
            server: tokio::spawn(serve_script(server, replies)),
        }
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

pub fn smtp_settings(host: &str, port: u16) -> SmtpSettings {
    SmtpSettings {
        host: Some(host.to_string()),
        port,
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        from: Some("no-reply@example.com".to_string()),
        connect_timeout_ms: 2_000,
        response_timeout_ms: 2_000,
        ..SmtpSettings::default()
    }
}

pub fn smtp_config(fallback_to_log_on_error: bool) -> MailerConfig {
    MailerConfig {
        provider: "smtp".to_string(),
        fallback_to_log_on_error,
        smtp: smtp_settings("smtp.example.com", 465),
    }
}

pub fn session_config() -> SessionConfig {
    smtp_settings("smtp.example.com", 465).resolve().unwrap()
}

/// Log lines written while a [`capture_logs`] guard is alive
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's `warn!` and above into a buffer
///
/// `#[tokio::test]` runs on a current-thread runtime, so the guard covers the
/// whole test body.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
