//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use redunda_config::ConfigError;
use redunda_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach Redunda: {message}")]
    #[diagnostic(
        code(redunda::connection_failed),
        help(
            "Check network connectivity and the service URL.\n\
             Override it with --endpoint or `endpoint` in your profile."
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Redunda rejected the API key")]
    #[diagnostic(
        code(redunda::auth_failed),
        help(
            "Verify the instance key on the Redunda instances page.\n\
             {message}"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(redunda::no_credentials),
        help(
            "Pass --api-key, set REDUNDA_API_KEY, or run:\n\
             redunda config init --profile {profile} --api-key <KEY> --keyring"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(redunda::not_found),
        help("Run: redunda {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("Unexpected response from Redunda: {message}")]
    #[diagnostic(code(redunda::protocol))]
    Protocol { message: String },

    #[error("{failed} file transfer(s) failed")]
    #[diagnostic(
        code(redunda::sync_incomplete),
        help("Failed transfers are retried on the next pass. Use -v for details.")
    )]
    SyncIncomplete { failed: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(redunda::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(redunda::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: redunda config init --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(redunda::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Cannot access local file {path}")]
    #[diagnostic(code(redunda::local_file))]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name, available } => CliError::ProfileNotFound {
                name,
                available: list_or_none(&available),
            },
            ConfigError::Keyring(e) => CliError::Validation {
                field: "keyring".into(),
                reason: e.to_string(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport {
                message,
                status: Some(401 | 403),
                ..
            } => CliError::AuthFailed { message },

            CoreError::Transport { message, .. } => CliError::ConnectionFailed { message },

            CoreError::ProtocolParse { message } => CliError::Protocol { message },

            CoreError::LocalIo { path, source } => CliError::LocalFile { path, source },

            CoreError::EncodingPrecondition { identifier, reason } => CliError::Validation {
                field: "file".into(),
                reason: format!("{identifier}: {reason}"),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
