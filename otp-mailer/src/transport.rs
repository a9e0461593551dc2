//! Secure channel establishment
//!
//! The session only needs a bidirectional byte stream. [`Connector`] opens
//! one; [`TlsTransport`] is the production implementation (implicit TLS,
//! usually port 465).
//!
//! # Security
//! - Certificates are always verified (Mozilla root set plus optional extra roots)
//! - SNI and name validation use the configured host
//! - No plaintext or insecure mode

use crate::config::SessionConfig;
use crate::error::{MailerError, Result};
use async_trait::async_trait;
use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

/// Opens the byte stream an SMTP session runs over
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open a channel to `config.host:config.port` within `config.connect_timeout`
    async fn connect(&self, config: &SessionConfig) -> Result<Self::Stream>;
}

/// Implicit-TLS transport
#[derive(Clone)]
pub struct TlsTransport {
    client_config: Arc<ClientConfig>,
}

impl TlsTransport {
    /// Transport trusting the Mozilla root set
    pub fn new() -> Self {
        Self::from_roots(default_root_store())
    }

    /// Transport trusting the Mozilla root set plus the given DER certificates
    ///
    /// Useful for private relays signed by an internal CA.
    pub fn with_extra_roots(certificates: &[Certificate]) -> Result<Self> {
        let mut roots = default_root_store();
        for certificate in certificates {
            roots.add(certificate).map_err(|e| {
                MailerError::Config(format!("Invalid root certificate: {}", e))
            })?;
        }
        debug!("Added {} extra root certificate(s)", certificates.len());
        Ok(Self::from_roots(roots))
    }

    fn from_roots(roots: RootCertStore) -> Self {
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Self {
            client_config: Arc::new(config),
        }
    }

    async fn open(&self, host: &str, port: u16) -> Result<TlsStream<TcpStream>> {
        let connect_error = |reason: String| MailerError::Connect {
            host: host.to_string(),
            port,
            reason,
        };

        let server_name = ServerName::try_from(host)
            .map_err(|e| connect_error(format!("Invalid server name: {}", e)))?;

        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        TlsConnector::from(self.client_config.clone())
            .connect(server_name, tcp)
            .await
            .map_err(|e| connect_error(format!("TLS handshake failed: {}", e)))
    }
}

impl Default for TlsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for TlsTransport {
    type Stream = TlsStream<TcpStream>;

    async fn connect(&self, config: &SessionConfig) -> Result<Self::Stream> {
        debug!("Connecting to {}:{} over TLS", config.host, config.port);

        let stream = tokio::time::timeout(config.connect_timeout, self.open(&config.host, config.port))
            .await
            .map_err(|_| MailerError::Connect {
                host: config.host.clone(),
                port: config.port,
                reason: format!(
                    "SMTP connect timeout after {}ms",
                    config.connect_timeout.as_millis()
                ),
            })??;

        info!("TLS session established with {}:{}", config.host, config.port);
        Ok(stream)
    }
}

fn default_root_store() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));
    roots
}
