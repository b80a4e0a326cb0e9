//! Session resolution: config file + profile + CLI flag overrides.
//!
//! This is the single place where CLI flags cross into
//! `redunda_core::ServiceConfig`.

use std::time::Duration;

use secrecy::SecretString;

use redunda_config::{Config, Profile};
use redunda_core::ServiceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a command needs to talk to Redunda.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile_name: String,
    pub service: ServiceConfig,
    pub tracked_files: Vec<String>,
    pub debug: bool,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config and apply CLI overrides (flag > env > profile > defaults).
///
/// Without a matching profile, flags and env vars alone may still describe
/// a usable session, unless `--profile` named a profile explicitly.
pub fn resolve_session(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = redunda_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            return Err(redunda_config::ConfigError::ProfileNotFound {
                name: profile_name,
                available: cfg.profile_names(),
            }
            .into());
        }
        None => &fallback,
    };

    // 1. API key (flag > env > profile chain)
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => redunda_config::resolve_api_key(profile, &profile_name)?,
    };

    let mut service = redunda_config::build_service_config(profile, &cfg.defaults, api_key)?;

    // 2. Endpoint, version, timeout
    if let Some(ref endpoint) = global.endpoint {
        service.endpoint = redunda_config::parse_endpoint(endpoint)?;
    }
    if let Some(ref version) = global.bot_version {
        service.bot_version = Some(version.clone());
    }
    if let Some(timeout) = global.timeout {
        service.timeout = Duration::from_secs(timeout);
    }
    service.validate()?;

    Ok(Session {
        profile_name,
        service,
        tracked_files: profile.tracked_files.clone(),
        debug: profile.debug,
    })
}
