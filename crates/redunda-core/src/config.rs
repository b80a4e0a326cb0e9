// ── Runtime service configuration ──
//
// Describes how to reach the coordination service and how often each
// service runs. Carries the API key but never touches disk; the CLI (or
// any embedding bot) builds a `ServiceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use redunda_api::transport::TlsMode;
use redunda_api::{RedundaClient, TransportConfig};

pub use redunda_api::DEFAULT_ENDPOINT;

use crate::error::CoreError;

/// Time between two heartbeats unless configured otherwise.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Time between two reconciliation passes unless configured otherwise.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(180);

/// Shortest period either scheduler accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration shared by the heartbeat and file services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service root (e.g. `https://redunda.sobotics.org`).
    pub endpoint: Url,
    /// The instance's API key, from the Redunda instances overview.
    pub api_key: SecretString,
    /// Bot version reported with every heartbeat.
    pub bot_version: Option<String>,
    pub heartbeat_interval: Duration,
    pub sync_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra CA certificate to trust (self-hosted instances).
    pub ca_cert: Option<PathBuf>,
}

impl ServiceConfig {
    /// Defaults for the public instance with the given API key.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key,
            bot_version: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            timeout: Duration::from_secs(30),
            ca_cert: None,
        }
    }

    /// Reject intervals the schedulers cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("heartbeat_interval", self.heartbeat_interval),
            ("sync_interval", self.sync_interval),
        ] {
            if value < MIN_INTERVAL {
                return Err(CoreError::Config {
                    message: format!("{name} must be at least 1s, got {value:?}"),
                });
            }
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Build the transport settings for this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: self.timeout,
        }
    }

    /// Validate and build a client for the configured endpoint.
    pub fn build_client(&self) -> Result<RedundaClient, CoreError> {
        self.validate()?;
        Ok(RedundaClient::new(
            self.endpoint.clone(),
            self.api_key.clone(),
            &self.transport(),
        )?)
    }
}

fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig::new(SecretString::from("key".to_owned()))
    }

    #[test]
    fn defaults_match_protocol() {
        let cfg = config();
        assert_eq!(cfg.endpoint.as_str(), "https://redunda.sobotics.org/");
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(cfg.sync_interval, Duration::from_secs(180));
        assert!(cfg.bot_version.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sub_second_intervals_are_rejected() {
        let mut cfg = config();
        cfg.heartbeat_interval = Duration::from_millis(500);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval"));
    }

    #[test]
    fn custom_ca_flows_into_transport() {
        let mut cfg = config();
        cfg.ca_cert = Some(PathBuf::from("/etc/ssl/redunda.pem"));
        assert!(matches!(cfg.transport().tls, TlsMode::CustomCa(ref p) if p.ends_with("redunda.pem")));
    }
}
