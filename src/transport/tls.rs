//! TLS configuration
//!
//! PEM-based rustls setup for both sides of the broker's connections. The
//! broker authenticates clients with the credential handshake rather than
//! client certificates, so the server side runs plain server-auth TLS and
//! clients validate the broker against a caller-supplied root certificate.

use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{Error, Result};

/// Server-side TLS configuration for the broker's listeners
#[derive(Clone)]
pub struct TlsServerConfig {
    config: Arc<rustls::ServerConfig>,
}

impl TlsServerConfig {
    /// Build from PEM-encoded certificate chain and private key bytes
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certs = parse_certificates(cert_pem)?;
        if certs.is_empty() {
            return Err(Error::Tls("no certificates found".into()));
        }
        let key = parse_private_key(key_pem)?;

        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| Error::Tls(format!("server config error: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Build from PEM files on disk
    pub fn from_pem_files(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Self> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Self::from_pem(&cert_pem, &key_pem)
    }

    /// Create an acceptor for inbound connections
    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(self.config.clone())
    }
}

/// Client-side TLS configuration for producers and consumers
#[derive(Clone)]
pub struct TlsClientConfig {
    config: Arc<rustls::ClientConfig>,
}

impl TlsClientConfig {
    /// Build from the PEM-encoded root certificate(s) the broker's
    /// certificate chains to
    pub fn from_ca_pem(ca_pem: &[u8]) -> Result<Self> {
        let ca_certs = parse_certificates(ca_pem)?;
        if ca_certs.is_empty() {
            return Err(Error::Tls("no CA certificates found".into()));
        }

        let mut root_store = RootCertStore::empty();
        for cert in ca_certs {
            root_store
                .add(cert)
                .map_err(|e| Error::Tls(format!("failed to add CA certificate: {e}")))?;
        }

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Build from a PEM file on disk
    pub fn from_ca_pem_file(ca_path: impl AsRef<Path>) -> Result<Self> {
        let ca_pem = std::fs::read(ca_path)?;
        Self::from_ca_pem(&ca_pem)
    }

    /// Create a connector for outbound connections
    pub fn connector(&self) -> TlsConnector {
        TlsConnector::from(self.config.clone())
    }
}

/// Parse PEM-encoded certificates
fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    CertificateDer::pem_slice_iter(pem)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("failed to parse certificates: {e}")))
}

/// Parse a PEM-encoded private key
fn parse_private_key(pem: &[u8]) -> Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_slice(pem)
        .map_err(|e| Error::Tls(format!("failed to parse private key: {e}")))
}
