//! Send a one-time passcode email using the configured provider

use clap::Parser;
use otp_mailer::{MailerConfig, OneTimeCode, OtpMailer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "send-otp", version, about = "Send a one-time passcode email")]
struct Cli {
    /// Recipient email address
    email: String,

    /// Passcode to send (a new six-digit code is generated if omitted)
    #[arg(long)]
    otp: Option<String>,

    /// TOML configuration file (environment variables take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otp_mailer=info,send_otp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            MailerConfig::load(path)?
        }
        None => MailerConfig::from_env()?,
    };

    let otp = cli
        .otp
        .unwrap_or_else(|| OneTimeCode::generate().code);

    let mailer = OtpMailer::new(config);
    info!("Mail provider: {}", mailer.config().provider);
    if let Some(host) = &mailer.config().smtp.host {
        info!("  SMTP relay: {}:{}", host, mailer.config().smtp.port);
    }

    let result = mailer.send_otp_email(&cli.email, &otp).await?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
