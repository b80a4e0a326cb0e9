//! Configuration for Redunda-coordinated bots.
//!
//! TOML profiles, API key resolution (env var, then system keyring, then
//! plaintext), and translation to `redunda_core::ServiceConfig`. The CLI
//! layers its flag overrides on top of this.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use redunda_core::ServiceConfig;

/// Keyring service name under which API keys are stored.
pub const KEYRING_SERVICE: &str = "redunda";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is selected explicitly.
    pub default_profile: Option<String>,

    /// Settings every profile inherits.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named bot profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between heartbeats.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    /// Seconds between reconciliation passes.
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            heartbeat_interval: default_heartbeat_interval(),
            sync_interval: default_sync_interval(),
        }
    }
}

fn default_endpoint() -> String {
    redunda_core::DEFAULT_ENDPOINT.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_heartbeat_interval() -> u64 {
    redunda_core::DEFAULT_HEARTBEAT_INTERVAL.as_secs()
}
fn default_sync_interval() -> u64 {
    redunda_core::DEFAULT_SYNC_INTERVAL.as_secs()
}

/// A named bot profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Service root override (e.g. a self-hosted instance).
    pub endpoint: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Version string reported with every heartbeat.
    pub bot_version: Option<String>,

    /// Local files to keep in sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracked_files: Vec<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,
    pub heartbeat_interval: Option<u64>,
    pub sync_interval: Option<u64>,

    /// Pin the instance to active and skip heartbeats.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "sobotics", "redunda").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("redunda");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment.
///
/// A missing file yields the defaults. Environment variables use the
/// `REDUNDA_` prefix with `__` as the nesting separator, e.g.
/// `REDUNDA_DEFAULTS__SYNC_INTERVAL=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("REDUNDA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/api-key"),
    )?)
}

/// Resolve an API key from the credential chain.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env -> env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's API key in the system keyring.
pub fn store_api_key(profile_name: &str, api_key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(api_key)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

fn interval(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a service endpoint URL.
pub fn parse_endpoint(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected an http(s) URL, got {raw}"),
        });
    }
    Ok(url)
}

/// Build a `ServiceConfig` from a profile, its defaults, and an already
/// resolved API key.
pub fn build_service_config(
    profile: &Profile,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<ServiceConfig, ConfigError> {
    let endpoint = parse_endpoint(profile.endpoint.as_deref().unwrap_or(&defaults.endpoint))?;
    let timeout = profile.timeout.unwrap_or(defaults.timeout);

    let mut config = ServiceConfig::new(api_key);
    config.endpoint = endpoint;
    config.bot_version.clone_from(&profile.bot_version);
    config.heartbeat_interval = interval(
        "heartbeat_interval",
        profile.heartbeat_interval.unwrap_or(defaults.heartbeat_interval),
    )?;
    config.sync_interval = interval(
        "sync_interval",
        profile.sync_interval.unwrap_or(defaults.sync_interval),
    )?;
    config.timeout = interval("timeout", timeout)?;
    config.ca_cert.clone_from(&profile.ca_cert);
    Ok(config)
}

/// Build a `ServiceConfig` from a profile, resolving its API key.
pub fn profile_to_service_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let api_key = resolve_api_key(profile, profile_name)?;
    build_service_config(profile, defaults, api_key)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "chat"

[defaults]
sync_interval = 60

[profiles.chat]
api_key = "plain-key"
bot_version = "1.4.0"
tracked_files = ["data/config.json", "data/state.json"]
heartbeat_interval = 10

[profiles.staging]
endpoint = "https://redunda.staging.example"
api_key = "staging-key"
debug = true
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.endpoint, "https://redunda.sobotics.org");
        assert_eq!(cfg.defaults.heartbeat_interval, 30);
        assert_eq!(cfg.defaults.sync_interval, 180);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_and_partial_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("chat"));
        assert_eq!(cfg.defaults.sync_interval, 60);
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.profile_names(), vec!["chat", "staging"]);

        let chat = cfg.profile("chat").unwrap();
        assert_eq!(chat.tracked_files, vec!["data/config.json", "data/state.json"]);
        assert!(!chat.debug);
        assert!(cfg.profile("staging").unwrap().debug);
    }

    #[test]
    fn unknown_profile_lists_alternatives() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();
        match cfg.profile("prod").unwrap_err() {
            ConfigError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, vec!["chat", "staging"]);
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn profile_overrides_defaults() {
        let (_dir, path) = write_sample();
        let cfg = load_config_from(&path).unwrap();

        let service =
            profile_to_service_config(cfg.profile("chat").unwrap(), "chat", &cfg.defaults).unwrap();
        assert_eq!(service.endpoint.as_str(), "https://redunda.sobotics.org/");
        assert_eq!(service.api_key.expose_secret(), "plain-key");
        assert_eq!(service.bot_version.as_deref(), Some("1.4.0"));
        assert_eq!(service.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(service.sync_interval, Duration::from_secs(60));

        let staging =
            profile_to_service_config(cfg.profile("staging").unwrap(), "staging", &cfg.defaults)
                .unwrap();
        assert_eq!(staging.endpoint.host_str(), Some("redunda.staging.example"));
    }

    #[test]
    fn api_key_env_takes_precedence_over_plaintext() {
        // PATH is set in every test environment.
        let profile = Profile {
            api_key_env: Some("PATH".into()),
            api_key: Some("plain".into()),
            ..Profile::default()
        };
        let key = resolve_api_key(&profile, "redunda-config-test").unwrap();
        assert_eq!(key.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn missing_credentials_are_reported() {
        let profile = Profile {
            api_key_env: Some("REDUNDA_CONFIG_TEST_UNSET_VARIABLE".into()),
            ..Profile::default()
        };
        let err = resolve_api_key(&profile, "redunda-config-test-empty").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "redunda-config-test-empty"));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let profile = Profile {
            sync_interval: Some(0),
            ..Profile::default()
        };
        let err = build_service_config(
            &profile,
            &Defaults::default(),
            SecretString::from("k".to_owned()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "sync_interval"));
    }

    #[test]
    fn non_http_endpoints_are_rejected() {
        assert!(parse_endpoint("ftp://redunda.example").is_err());
        assert!(parse_endpoint("not a url").is_err());
        assert!(parse_endpoint("http://localhost:3000").is_ok());
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                api_key_env: Some("BOT_REDUNDA_KEY".into()),
                tracked_files: vec!["state.json".into()],
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("api_key_env = \"BOT_REDUNDA_KEY\""));
        assert!(!written.contains("debug"));

        let loaded = load_config_from(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(profile.tracked_files, vec!["state.json"]);
        assert_eq!(profile.api_key_env.as_deref(), Some("BOT_REDUNDA_KEY"));
    }
}
