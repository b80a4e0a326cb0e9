// Shared transport configuration for building reqwest::Client instances.
//
// Every request the library makes goes through a client built here, so
// timeout, TLS roots, and the library user agent live in one place.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Public Redunda instance.
pub const DEFAULT_ENDPOINT: &str = "https://redunda.sobotics.org";

/// The user agent sent with every request, e.g. `redunda-lib-rust/0.1.0`.
pub fn user_agent() -> String {
    format!("redunda-lib-rust/{}", env!("CARGO_PKG_VERSION"))
}

/// TLS root configuration.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled/system certificate store.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(user_agent());

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
